//! Per-probe null result file names.

use std::path::{Path, PathBuf};

use crate::types::DeformationMode;

/// Path of the null result file for a probe at `eps`.
///
/// `base.json` becomes `base_<mode>_<eps>.json` with `eps` printed to six
/// decimals. A template without a `.json` extension gets the suffix and the
/// extension appended.
pub fn null_file_path(template: &Path, mode: DeformationMode, eps: f64) -> PathBuf {
    let suffix = format!("_{}_{:.6}.json", mode, eps);
    let file_name = template
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = file_name.strip_suffix(".json").unwrap_or(&file_name);
    template.with_file_name(format!("{stem}{suffix}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_file_naming() {
        let path = null_file_path(Path::new("/data/null_lr.json"), DeformationMode::Mean, 0.25);
        assert_eq!(path, PathBuf::from("/data/null_lr_mean_0.250000.json"));
    }

    #[test]
    fn test_null_file_rounds_to_six_decimals() {
        let path = null_file_path(Path::new("null.json"), DeformationMode::Both, 0.1234567);
        assert_eq!(path, PathBuf::from("null_both_0.123457.json"));
    }

    #[test]
    fn test_null_file_without_extension() {
        let path = null_file_path(Path::new("out/null"), DeformationMode::Std, 1.0);
        assert_eq!(path, PathBuf::from("out/null_std_1.000000.json"));
    }
}
