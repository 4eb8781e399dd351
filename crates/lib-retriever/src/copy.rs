use std::path::Path;

use crate::error::RetrieveError;

/// Copy the tree under `from` into `to`, creating `to` as needed and
/// overwriting files that already exist there.
pub fn copy_tree(from: &Path, to: &Path) -> Result<u64, RetrieveError> {
    let fail = |source: std::io::Error| RetrieveError::Copy {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        source,
    };

    std::fs::create_dir_all(to).map_err(fail)?;

    let mut copied = 0;
    for entry in std::fs::read_dir(from).map_err(fail)? {
        let entry = entry.map_err(fail)?;
        let source = entry.path();
        let dest = to.join(entry.file_name());

        if entry.file_type().map_err(fail)?.is_dir() {
            copied += copy_tree(&source, &dest)?;
        } else {
            std::fs::copy(&source, &dest).map_err(|e| RetrieveError::Copy {
                from: source.clone(),
                to: dest.clone(),
                source: e,
            })?;
            copied += 1;
        }
    }

    Ok(copied)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copies_nested_tree() {
        let src = tempfile::tempdir().unwrap();
        let dst = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(src.path().join("vars")).unwrap();
        std::fs::create_dir_all(src.path().join("src/org/example")).unwrap();
        std::fs::write(src.path().join("vars/hello.groovy"), "def call() {}").unwrap();
        std::fs::write(src.path().join("src/org/example/Util.groovy"), "class Util {}").unwrap();
        std::fs::write(src.path().join("version.txt"), "1.0").unwrap();

        let target = dst.path().join("libs/foo");
        let copied = copy_tree(src.path(), &target).unwrap();

        assert_eq!(copied, 3);
        assert_eq!(
            std::fs::read_to_string(target.join("src/org/example/Util.groovy")).unwrap(),
            "class Util {}"
        );
        assert!(target.join("vars/hello.groovy").is_file());
    }

    #[test]
    fn missing_source_is_a_copy_error() {
        let dst = tempfile::tempdir().unwrap();
        let err = copy_tree(&dst.path().join("nope"), &dst.path().join("out")).unwrap_err();
        assert!(matches!(err, RetrieveError::Copy { .. }));
    }
}
