//! Writing rendered files to disk

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

#[cfg(unix)]
const GENERATED_FILE_MODE: u32 = 0o644;

/// A rendered template waiting to be written
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedFile {
    pub path: PathBuf,
    pub content: String,
}

/// Create the parent directories of `path` (if any) and write `content` to it.
///
/// The content goes to a temporary file in the destination directory first and
/// is then renamed over the destination, so it is either fully replaced or left
/// as it was. A symlinked `path` is written through: the file it points at is
/// replaced and the link stays. An existing file keeps its permissions; new
/// files are created `0644` on unix.
pub fn write_file(path: &Path, content: &str) -> io::Result<()> {
    let target = write_target(path)?;
    let parent = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)?;

    let mut file = NamedTempFile::new_in(parent)?;
    file.write_all(content.as_bytes())?;
    file.flush()?;

    // Temporary files are created owner-only
    let permissions = match fs::metadata(&target) {
        Ok(metadata) => Some(metadata.permissions()),
        Err(_) => new_file_permissions(),
    };
    if let Some(permissions) = permissions {
        file.as_file().set_permissions(permissions)?;
    }

    file.persist(&target).map_err(|e| e.error)?;
    Ok(())
}

/// The file the rename must land on: `path` itself, or what it links to
fn write_target(path: &Path) -> io::Result<PathBuf> {
    match fs::symlink_metadata(path) {
        Ok(metadata) if metadata.file_type().is_symlink() => match fs::canonicalize(path) {
            Ok(resolved) => Ok(resolved),
            // Dangling link: create the file it names
            Err(_) => {
                let link = fs::read_link(path)?;
                Ok(match path.parent() {
                    Some(parent) if link.is_relative() => parent.join(link),
                    _ => link,
                })
            }
        },
        _ => Ok(path.to_path_buf()),
    }
}

#[cfg(unix)]
fn new_file_permissions() -> Option<fs::Permissions> {
    use std::os::unix::fs::PermissionsExt;
    Some(fs::Permissions::from_mode(GENERATED_FILE_MODE))
}

#[cfg(not(unix))]
fn new_file_permissions() -> Option<fs::Permissions> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_file_creates_parent_directories() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("uavcan/node/Heartbeat_1_0.hpp");

        write_file(&path, "struct Heartbeat {};").unwrap();

        assert!(path.is_file());
        assert_eq!(fs::read_to_string(&path).unwrap(), "struct Heartbeat {};");
    }

    #[test]
    fn test_write_file_replaces_existing_content() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("out.hpp");
        fs::write(&path, "a much longer previous body that must disappear").unwrap();

        write_file(&path, "short").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "short");
        // no temporary files left next to the output
        assert_eq!(fs::read_dir(temp_dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_write_file_into_existing_directory_is_idempotent() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let nested = temp_dir.path().join("deeply/nested");
        fs::create_dir_all(&nested).unwrap();

        write_file(&nested.join("a.hpp"), "a").unwrap();
        write_file(&nested.join("b.hpp"), "b").unwrap();

        assert!(nested.join("a.hpp").exists());
        assert!(nested.join("b.hpp").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_written_files_are_world_readable() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("readable.hpp");
        write_file(&path, "x").unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o644);
    }

    #[test]
    fn test_write_file_fails_when_parent_is_a_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let blocker = temp_dir.path().join("blocker");
        fs::write(&blocker, "").unwrap();

        let result = write_file(&blocker.join("child.hpp"), "x");
        assert!(result.is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_existing_file_keeps_its_mode() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("private.hpp");
        fs::write(&path, "old").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o600)).unwrap();

        write_file(&path, "new").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "new");
        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_output_is_written_through() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let real = temp_dir.path().join("real/Heartbeat.hpp");
        fs::create_dir_all(real.parent().unwrap()).unwrap();
        fs::write(&real, "old").unwrap();
        let link = temp_dir.path().join("Heartbeat.hpp");
        std::os::unix::fs::symlink(&real, &link).unwrap();

        write_file(&link, "new").unwrap();

        assert!(fs::symlink_metadata(&link).unwrap().file_type().is_symlink());
        assert_eq!(fs::read_to_string(&real).unwrap(), "new");
    }

    #[cfg(unix)]
    #[test]
    fn test_dangling_symlink_creates_its_target() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let link = temp_dir.path().join("Value.hpp");
        std::os::unix::fs::symlink("generated/Value.hpp", &link).unwrap();

        write_file(&link, "union Value;").unwrap();

        assert!(fs::symlink_metadata(&link).unwrap().file_type().is_symlink());
        let target = temp_dir.path().join("generated/Value.hpp");
        assert_eq!(fs::read_to_string(target).unwrap(), "union Value;");
    }
}
