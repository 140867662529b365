//! Deterministic tar.gz encoding of file trees
//!
//! Entries are written in sorted path order with a fixed mode and a zero
//! mtime, and the gzip header carries no timestamp, so equal trees always
//! produce byte-identical archives.

use std::io::Read;

use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use skillsync_fs::FileTree;
use tar::{Archive, Builder, EntryType, Header};

const ENTRY_MODE: u32 = 0o644;

/// Encode `tree` as a gzip-compressed tar archive.
pub fn pack(tree: &FileTree) -> std::io::Result<Vec<u8>> {
    let encoder = GzEncoder::new(Vec::new(), Compression::default());
    let mut builder = Builder::new(encoder);

    for (path, content) in tree.iter() {
        let mut header = Header::new_gnu();
        header.set_entry_type(EntryType::Regular);
        header.set_size(content.len() as u64);
        header.set_mode(ENTRY_MODE);
        header.set_mtime(0);
        builder.append_data(&mut header, path.as_str(), content)?;
    }

    builder.into_inner()?.finish()
}

/// Decode an archive produced by [`pack`].
///
/// Non-file entries are skipped. An entry whose path would escape the tree
/// root is an error.
pub fn unpack(bytes: &[u8]) -> std::io::Result<FileTree> {
    let mut archive = Archive::new(GzDecoder::new(bytes));
    let mut tree = FileTree::new();

    for entry in archive.entries()? {
        let mut entry = entry?;
        if !entry.header().entry_type().is_file() {
            continue;
        }
        let path = entry.path()?.to_string_lossy().into_owned();
        let mut content = Vec::with_capacity(entry.size() as usize);
        entry.read_to_end(&mut content)?;
        tree.insert(path, content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    }
    Ok(tree)
}
