use anyhow::{Context, Result};
use std::collections::HashMap;
use std::io::Write;
use zipme_core::UploadedFile;

const FALLBACK_FILE_NAME: &str = "unnamed";

/// Make a file name safe for use as an archive entry.
///
/// Every character other than ASCII letters, digits, `.` and `-` becomes `_`, which also
/// removes path separators. Names that end up empty or made only of dots fall back to
/// `unnamed`.
pub fn sanitize_file_name(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if sanitized.chars().all(|c| c == '.') {
        FALLBACK_FILE_NAME.to_string()
    } else {
        sanitized
    }
}

/// Entries in submission order after sanitizing. A later file whose sanitized name
/// collides with an earlier one replaces its payload and keeps the earlier position.
fn archive_entries(files: &[UploadedFile]) -> Vec<(String, &[u8])> {
    let mut entries: Vec<(String, &[u8])> = Vec::with_capacity(files.len());
    let mut positions: HashMap<String, usize> = HashMap::with_capacity(files.len());

    for file in files {
        let name = sanitize_file_name(&file.name);
        match positions.get(&name) {
            Some(&index) => entries[index].1 = file.data.as_slice(),
            None => {
                positions.insert(name.clone(), entries.len());
                entries.push((name, file.data.as_slice()));
            }
        }
    }

    entries
}

/// Build a deflate-compressed zip archive holding every file.
pub fn build_zip_archive(files: &[UploadedFile]) -> Result<Vec<u8>> {
    use zip::write::{FileOptions, ZipWriter};
    use zip::CompressionMethod;

    let mut buffer = Vec::new();
    {
        let mut zip = ZipWriter::new(std::io::Cursor::new(&mut buffer));
        let options = FileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .unix_permissions(0o644);

        for (name, data) in archive_entries(files) {
            let entry_options = options.large_file(data.len() as u64 >= u32::MAX as u64);

            zip.start_file(name.as_str(), entry_options)
                .with_context(|| format!("Failed to add file to ZIP: {}", name))?;
            zip.write_all(data)
                .with_context(|| format!("Failed to write file data to ZIP: {}", name))?;
        }

        zip.finish().context("Failed to finalize ZIP archive")?;
    }

    Ok(buffer)
}

/// Build the archive on the blocking thread pool.
pub async fn build_zip_archive_blocking(files: Vec<UploadedFile>) -> Result<Vec<u8>> {
    tokio::task::spawn_blocking(move || build_zip_archive(&files))
        .await
        .context("Archive task panicked")?
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Read};

    fn read_entries(archive: Vec<u8>) -> Vec<(String, Vec<u8>)> {
        let mut zip = zip::ZipArchive::new(Cursor::new(archive)).unwrap();
        (0..zip.len())
            .map(|i| {
                let mut entry = zip.by_index(i).unwrap();
                let mut data = Vec::new();
                entry.read_to_end(&mut data).unwrap();
                (entry.name().to_string(), data)
            })
            .collect()
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("report.pdf"), "report.pdf");
        assert_eq!(sanitize_file_name("my report (v2).pdf"), "my_report__v2_.pdf");
        assert_eq!(sanitize_file_name("../../etc/passwd"), ".._.._etc_passwd");
        assert_eq!(sanitize_file_name("résumé.txt"), "r_sum_.txt");
        assert_eq!(sanitize_file_name(""), "unnamed");
        assert_eq!(sanitize_file_name(".."), "unnamed");
    }

    #[test]
    fn test_archive_recovers_sanitized_names_and_content() {
        let files = vec![
            UploadedFile::new("report.pdf", b"0123456789".to_vec()),
            UploadedFile::new("photo 1.jpg", vec![0xFFu8, 0xD8, 0xFF]),
            UploadedFile::new("notes/today.txt", b"hello".to_vec()),
        ];

        let entries = read_entries(build_zip_archive(&files).unwrap());

        assert_eq!(
            entries,
            vec![
                ("report.pdf".to_string(), b"0123456789".to_vec()),
                ("photo_1.jpg".to_string(), vec![0xFFu8, 0xD8, 0xFF]),
                ("notes_today.txt".to_string(), b"hello".to_vec()),
            ]
        );
    }

    #[test]
    fn test_colliding_names_keep_last_payload_in_first_position() {
        let files = vec![
            UploadedFile::new("a b.txt", b"first".to_vec()),
            UploadedFile::new("other.txt", b"other".to_vec()),
            UploadedFile::new("a_b.txt", b"second".to_vec()),
        ];

        let entries = read_entries(build_zip_archive(&files).unwrap());

        assert_eq!(
            entries,
            vec![
                ("a_b.txt".to_string(), b"second".to_vec()),
                ("other.txt".to_string(), b"other".to_vec()),
            ]
        );
    }

    #[test]
    fn test_entries_are_deflated() {
        let files = vec![UploadedFile::new("zeros.bin", vec![0u8; 64 * 1024])];
        let archive = build_zip_archive(&files).unwrap();
        assert!(archive.len() < 4 * 1024);

        let mut zip = zip::ZipArchive::new(Cursor::new(archive)).unwrap();
        let entry = zip.by_index(0).unwrap();
        assert_eq!(entry.compression(), zip::CompressionMethod::Deflated);
    }

    #[tokio::test]
    async fn test_build_on_blocking_pool() {
        let files = vec![UploadedFile::new("a.txt", b"a".to_vec())];
        let archive = build_zip_archive_blocking(files).await.unwrap();
        assert_eq!(read_entries(archive).len(), 1);
    }
}
