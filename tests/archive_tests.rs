#[cfg(test)]
mod tests {
    use flate2::read::GzDecoder;
    use std::collections::BTreeMap;
    use std::io::Read;
    use std::path::Path;
    use tempfile::TempDir;
    use uplugin_release::archive::{ArchiveFormat, archive};

    fn staged_tree(root: &Path) {
        std::fs::create_dir_all(root.join("sub")).unwrap();
        std::fs::write(root.join("a.txt"), "alpha").unwrap();
        std::fs::write(root.join("sub/b.txt"), "beta").unwrap();
    }

    fn expected() -> BTreeMap<String, String> {
        BTreeMap::from([
            ("a.txt".to_string(), "alpha".to_string()),
            ("sub/b.txt".to_string(), "beta".to_string()),
        ])
    }

    #[tokio::test]
    async fn test_zip_round_trip() {
        let temp = TempDir::new().unwrap();
        let staging_root = temp.path().join("package-release");
        staged_tree(&staging_root);

        let written = archive(&staging_root, &temp.path().join("Widget-1.0"), ArchiveFormat::Zip)
            .await
            .unwrap();
        assert_eq!(written, temp.path().join("Widget-1.0.zip"));

        let mut zip = zip::ZipArchive::new(std::fs::File::open(&written).unwrap()).unwrap();
        let mut files = BTreeMap::new();
        for i in 0..zip.len() {
            let mut entry = zip.by_index(i).unwrap();
            if entry.is_dir() {
                continue;
            }
            let mut content = String::new();
            entry.read_to_string(&mut content).unwrap();
            files.insert(entry.name().to_string(), content);
        }
        assert_eq!(files, expected());
    }

    #[tokio::test]
    async fn test_tar_gz_round_trip() {
        let temp = TempDir::new().unwrap();
        let staging_root = temp.path().join("package-release");
        staged_tree(&staging_root);

        let written = archive(
            &staging_root,
            &temp.path().join("dist/Widget-1.0"),
            ArchiveFormat::TarGz,
        )
        .await
        .unwrap();
        assert_eq!(written, temp.path().join("dist/Widget-1.0.tar.gz"));

        let decoder = GzDecoder::new(std::fs::File::open(&written).unwrap());
        let mut tar = tar::Archive::new(decoder);
        let mut files = BTreeMap::new();
        for entry in tar.entries().unwrap() {
            let mut entry = entry.unwrap();
            if entry.header().entry_type().is_dir() {
                continue;
            }
            let name = entry.path().unwrap().to_string_lossy().replace('\\', "/");
            let mut content = String::new();
            entry.read_to_string(&mut content).unwrap();
            files.insert(name, content);
        }
        assert_eq!(files, expected());
    }

    #[tokio::test]
    async fn test_archive_inside_staging_tree_rejected() {
        let temp = TempDir::new().unwrap();
        let staging_root = temp.path().join("package-release");
        staged_tree(&staging_root);

        let result = archive(&staging_root, &staging_root.join("self"), ArchiveFormat::Zip).await;
        assert!(result.is_err());
        assert!(!staging_root.join("self.zip").exists());
    }

    #[tokio::test]
    async fn test_missing_staging_tree_rejected() {
        let temp = TempDir::new().unwrap();
        let result = archive(
            &temp.path().join("absent"),
            &temp.path().join("out"),
            ArchiveFormat::TarGz,
        )
        .await;
        assert!(result.is_err());
    }
}
