use std::fs;
use std::io;

use camino::{Utf8Path, Utf8PathBuf};
use flate2::read::GzDecoder;

use crate::error::PiomasError;

/// Decompress `<name>.gz` to `<name>` next to itself. The archive is kept;
/// the returned path is the uncompressed file.
pub fn gunzip_file(gz_path: &Utf8Path) -> Result<Utf8PathBuf, PiomasError> {
    let out_path = strip_gz(gz_path)?;

    let file = fs::File::open(gz_path.as_std_path())
        .map_err(|err| PiomasError::Filesystem(format!("open {gz_path}: {err}")))?;
    let mut decoder = GzDecoder::new(file);
    let mut out = fs::File::create(out_path.as_std_path())
        .map_err(|err| PiomasError::Filesystem(format!("create {out_path}: {err}")))?;
    io::copy(&mut decoder, &mut out)
        .map_err(|err| PiomasError::Filesystem(format!("gunzip {gz_path}: {err}")))?;

    Ok(out_path)
}

fn strip_gz(gz_path: &Utf8Path) -> Result<Utf8PathBuf, PiomasError> {
    match gz_path.as_str().strip_suffix(".gz") {
        Some(stem) => Ok(Utf8PathBuf::from(stem)),
        None => Err(PiomasError::Filesystem(format!(
            "{gz_path} does not end in .gz"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use flate2::Compression;
    use flate2::write::GzEncoder;

    use super::*;

    #[test]
    fn gunzip_strips_suffix() {
        let dir = tempfile::tempdir().unwrap();
        let gz_path =
            Utf8PathBuf::from_path_buf(dir.path().join("heff.H2019.gz")).unwrap();

        let mut encoder = GzEncoder::new(
            fs::File::create(gz_path.as_std_path()).unwrap(),
            Compression::default(),
        );
        encoder.write_all(b"raw bytes").unwrap();
        encoder.finish().unwrap();

        let out = gunzip_file(&gz_path).unwrap();
        assert!(out.as_str().ends_with("heff.H2019"));
        assert_eq!(fs::read(out.as_std_path()).unwrap(), b"raw bytes");
        // The archive stays in place.
        assert!(gz_path.as_std_path().exists());
    }

    #[test]
    fn non_gz_path_is_rejected() {
        let err = gunzip_file(Utf8Path::new("heff.H2019")).unwrap_err();
        assert!(matches!(err, PiomasError::Filesystem(_)));
    }
}
