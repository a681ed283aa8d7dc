//! A map-backed in-memory file system.
//!
//! Keys are slash-separated paths without a leading slash. A directory is an
//! explicit entry whose key ends in `/`; directories also exist implicitly
//! as the ancestors of any stored file.

use super::{clean, epoch, FileInfo, FileReader, Result, Vfs, VfsError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::io::Cursor;
use std::sync::RwLock;
use tokio::io::{AsyncRead, AsyncReadExt};

const FILE_MODE: u32 = 0o644;
const DIR_MODE: u32 = 0o755;

#[derive(Debug, Clone)]
struct Entry {
    data: Vec<u8>,
    modified: DateTime<Utc>,
}

/// An in-memory [`Vfs`] storing entries in a path-to-content map.
///
/// Used as the reference implementation of the VFS contract and as the test
/// backend.
#[derive(Debug, Default)]
pub struct Memory {
    entries: RwLock<BTreeMap<String, Entry>>,
}

impl Memory {
    /// Creates an empty file system.
    pub fn new() -> Memory {
        Memory::default()
    }

    /// Creates a file system pre-populated with the given entries.
    ///
    /// Keys are slash-separated paths without a leading slash; a key ending
    /// in `/` denotes an (empty) directory.
    pub fn with_files<K, V, I>(files: I) -> Memory
    where
        K: Into<String>,
        V: Into<Vec<u8>>,
        I: IntoIterator<Item = (K, V)>,
    {
        let now = Utc::now();
        let entries = files
            .into_iter()
            .map(|(k, v)| {
                (
                    k.into(),
                    Entry {
                        data: v.into(),
                        modified: now,
                    },
                )
            })
            .collect();
        Memory {
            entries: RwLock::new(entries),
        }
    }

    // Normalizes a path into map-key form: cleaned and without the leading slash.
    fn key(path: &str) -> String {
        clean(path).trim_start_matches('/').to_string()
    }

    fn lock_read(&self) -> std::sync::RwLockReadGuard<BTreeMap<String, Entry>> {
        match self.entries.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn lock_write(&self) -> std::sync::RwLockWriteGuard<BTreeMap<String, Entry>> {
        match self.entries.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn base_name(key: &str) -> String {
        key.trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or("")
            .to_string()
    }

    fn file_info(key: &str, entry: &Entry) -> FileInfo {
        FileInfo {
            name: Memory::base_name(key),
            size: entry.data.len() as u64,
            modified: entry.modified,
            is_dir: false,
            mode: FILE_MODE,
        }
    }

    fn dir_info(name: &str, modified: DateTime<Utc>) -> FileInfo {
        FileInfo {
            name: name.to_string(),
            size: 0,
            modified,
            is_dir: true,
            mode: DIR_MODE,
        }
    }

    // Tells whether `key` exists as a directory, explicitly or as the
    // ancestor of some stored entry. The root always exists.
    fn dir_exists(entries: &BTreeMap<String, Entry>, key: &str) -> bool {
        if key.is_empty() {
            return true;
        }
        let prefix = format!("{}/", key);
        entries.contains_key(&prefix) || entries.range(prefix.clone()..).next().map_or(false, |(k, _)| k.starts_with(&prefix))
    }
}

#[async_trait]
impl Vfs for Memory {
    async fn open(&self, path: &str) -> Result<FileReader> {
        let key = Memory::key(path);
        let entries = self.lock_read();
        match entries.get(&key) {
            Some(entry) => Ok(Box::new(Cursor::new(entry.data.clone()))),
            None => Err(VfsError::NotFound),
        }
    }

    async fn stat(&self, path: &str) -> Result<FileInfo> {
        let key = Memory::key(path);
        let entries = self.lock_read();
        if key.is_empty() {
            return Ok(Memory::dir_info("/", epoch()));
        }
        if let Some(entry) = entries.get(&key) {
            return Ok(Memory::file_info(&key, entry));
        }
        let dir_key = format!("{}/", key);
        if let Some(entry) = entries.get(&dir_key) {
            return Ok(Memory::dir_info(&Memory::base_name(&key), entry.modified));
        }
        if Memory::dir_exists(&entries, &key) {
            return Ok(Memory::dir_info(&Memory::base_name(&key), epoch()));
        }
        Err(VfsError::NotFound)
    }

    async fn read_dir(&self, path: &str) -> Result<Vec<FileInfo>> {
        let key = Memory::key(path);
        let entries = self.lock_read();
        if !Memory::dir_exists(&entries, &key) {
            return Err(VfsError::NotFound);
        }
        let prefix = if key.is_empty() { String::new() } else { format!("{}/", key) };

        // Children are merged from explicit entries and the implied
        // ancestors of deeper paths; the BTreeMap keeps them sorted.
        let mut children: BTreeMap<String, FileInfo> = BTreeMap::new();
        for (k, entry) in entries.iter() {
            if !k.starts_with(&prefix) || k == &prefix {
                continue;
            }
            let rest = &k[prefix.len()..];
            match rest.find('/') {
                None => {
                    children.insert(rest.to_string(), Memory::file_info(k, entry));
                }
                Some(idx) => {
                    let name = &rest[..idx];
                    // A deeper entry implies a child directory; an explicit
                    // directory key ("name/") lands here too.
                    children
                        .entry(name.to_string())
                        .or_insert_with(|| Memory::dir_info(name, entry.modified));
                }
            }
        }
        Ok(children.into_iter().map(|(_, fi)| fi).collect())
    }

    async fn create(&self, path: &str, reader: &mut (dyn AsyncRead + Send + Unpin)) -> Result<u64> {
        let key = Memory::key(path);
        {
            let entries = self.lock_read();
            if key.is_empty() || entries.contains_key(&format!("{}/", key)) || Memory::dir_exists(&entries, &key) {
                return Err(VfsError::AlreadyExists);
            }
        }

        let mut data = Vec::new();
        reader.read_to_end(&mut data).await?;
        let n = data.len() as u64;

        let mut entries = self.lock_write();
        entries.insert(
            key,
            Entry {
                data,
                modified: Utc::now(),
            },
        );
        Ok(n)
    }

    async fn mkdir(&self, path: &str) -> Result<()> {
        let key = Memory::key(path);
        let mut entries = self.lock_write();
        if key.is_empty() || entries.contains_key(&key) || Memory::dir_exists(&entries, &key) {
            return Err(VfsError::AlreadyExists);
        }
        entries.insert(
            format!("{}/", key),
            Entry {
                data: Vec::new(),
                modified: Utc::now(),
            },
        );
        Ok(())
    }

    async fn remove(&self, path: &str) -> Result<()> {
        let key = Memory::key(path);
        if key.is_empty() {
            return Err(VfsError::PermissionDenied);
        }
        let mut entries = self.lock_write();

        // A plain key is a file.
        if entries.remove(&key).is_some() {
            Memory::keep_parent(&mut entries, &key);
            return Ok(());
        }

        // A key with a trailing slash is a directory; it must be empty.
        let dir_key = format!("{}/", key);
        let not_empty = entries
            .range(dir_key.clone()..)
            .any(|(k, _)| k != &dir_key && k.starts_with(&dir_key));
        if not_empty {
            return Err(VfsError::NotEmpty);
        }
        if entries.remove(&dir_key).is_some() {
            Memory::keep_parent(&mut entries, &key);
            return Ok(());
        }
        Err(VfsError::NotFound)
    }

    fn name(&self) -> &'static str {
        "mapfs"
    }
}

impl Memory {
    // Removing the last entry of a directory would make the directory itself
    // vanish, so pin it with an explicit entry.
    fn keep_parent(entries: &mut BTreeMap<String, Entry>, key: &str) {
        if let Some(idx) = key.rfind('/') {
            let parent = format!("{}/", &key[..idx]);
            entries.entry(parent).or_insert_with(|| Entry {
                data: Vec::new(),
                modified: Utc::now(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Memory {
        Memory::with_files(vec![
            ("foo/bar/three.txt", "a"),
            ("foo/bar.txt", "b"),
            ("top.txt", "c"),
            ("other-top.txt", "d"),
        ])
    }

    async fn slurp(fs: &Memory, path: &str) -> String {
        let mut r = fs.open(path).await.unwrap();
        let mut buf = Vec::new();
        r.read_to_end(&mut buf).await.unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[tokio::test]
    async fn open() {
        let fs = sample();
        for (path, want) in [
            ("/foo/bar/three.txt", "a"),
            ("foo/bar/three.txt", "a"),
            ("foo/bar.txt", "b"),
            ("top.txt", "c"),
            ("/top.txt", "c"),
            ("foo/bar/../bar.txt", "b"),
        ] {
            assert_eq!(slurp(&fs, path).await, want, "open {}", path);
        }
        assert!(matches!(fs.open("/xxxx").await, Err(VfsError::NotFound)));
    }

    #[tokio::test]
    async fn stat() {
        let fs = sample();
        let fi = fs.stat("/foo/bar.txt").await.unwrap();
        assert_eq!(fi.name, "bar.txt");
        assert_eq!(fi.size, 1);
        assert!(!fi.is_dir);

        let fi = fs.stat("/foo").await.unwrap();
        assert!(fi.is_dir);
        assert_eq!(fi.name, "foo");

        let fi = fs.stat("/").await.unwrap();
        assert!(fi.is_dir);

        assert!(matches!(fs.stat("/nope").await, Err(VfsError::NotFound)));
    }

    #[tokio::test]
    async fn read_dir() {
        let fs = sample();
        let root: Vec<String> = fs.read_dir("/").await.unwrap().into_iter().map(|fi| fi.name).collect();
        assert_eq!(root, vec!["foo", "other-top.txt", "top.txt"]);

        let foo = fs.read_dir("/foo").await.unwrap();
        assert_eq!(foo.len(), 2);
        assert_eq!(foo[0].name, "bar");
        assert!(foo[0].is_dir);
        assert_eq!(foo[1].name, "bar.txt");
        assert!(!foo[1].is_dir);

        assert!(matches!(fs.read_dir("/nope").await, Err(VfsError::NotFound)));
    }

    #[tokio::test]
    async fn create_and_remove() {
        let fs = sample();
        let mut src = Cursor::new(b"hello".to_vec());
        let n = fs.create("/newfile", &mut src).await.unwrap();
        assert_eq!(n, 5);
        assert_eq!(slurp(&fs, "/newfile").await, "hello");

        // Truncating overwrite.
        let mut src = Cursor::new(b"x".to_vec());
        fs.create("/newfile", &mut src).await.unwrap();
        assert_eq!(slurp(&fs, "/newfile").await, "x");

        // Creating over a directory fails.
        let mut src = Cursor::new(Vec::new());
        assert!(matches!(fs.create("/foo", &mut src).await, Err(VfsError::AlreadyExists)));

        fs.remove("/newfile").await.unwrap();
        assert!(matches!(fs.open("/newfile").await, Err(VfsError::NotFound)));
    }

    #[tokio::test]
    async fn mkdir() {
        let fs = sample();
        fs.mkdir("/dir").await.unwrap();
        assert!(fs.stat("/dir").await.unwrap().is_dir);
        assert!(matches!(fs.mkdir("/dir").await, Err(VfsError::AlreadyExists)));
        assert!(matches!(fs.mkdir("/top.txt").await, Err(VfsError::AlreadyExists)));
        assert!(matches!(fs.mkdir("/foo").await, Err(VfsError::AlreadyExists)));

        // A fresh directory lists as empty, not as missing.
        assert_eq!(fs.read_dir("/dir").await.unwrap().len(), 0);
    }

    #[tokio::test]
    async fn remove_directory() {
        let fs = sample();
        assert!(matches!(fs.remove("/foo").await, Err(VfsError::NotEmpty)));

        fs.mkdir("/empty").await.unwrap();
        fs.remove("/empty").await.unwrap();
        assert!(matches!(fs.stat("/empty").await, Err(VfsError::NotFound)));

        // Removing the only file of a directory keeps the directory alive.
        fs.remove("/foo/bar/three.txt").await.unwrap();
        assert!(fs.stat("/foo/bar").await.unwrap().is_dir);
    }
}
