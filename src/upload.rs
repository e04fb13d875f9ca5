//! Article image upload
//!
//! The editor sends the picture as base64 (optionally as a full data URL).
//! It is decoded, stored under `articles/<uuid>.<ext>`, and the public URL
//! is returned for the article's `imageUrl`.

use std::collections::BTreeMap;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::UploadError;
use crate::Result;

/// Filename assumed when the request carries none
pub const DEFAULT_FILENAME: &str = "image.jpg";

/// Folder prefix of uploaded object keys
pub const KEY_PREFIX: &str = "articles";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UploadRequest {
    /// Base64 payload, with or without a `data:...;base64,` prefix
    pub image: String,
    #[serde(default)]
    pub filename: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedImage {
    pub url: String,
    /// Object key the bytes were stored under
    pub filename: String,
}

/// Where uploaded bytes end up
pub trait MediaStore {
    fn put(&mut self, key: &str, bytes: &[u8], content_type: &str) -> Result<()>;
}

/// In-memory media bucket
#[derive(Debug, Clone, Default)]
pub struct MemoryMedia {
    objects: BTreeMap<String, (String, Vec<u8>)>,
}

impl MemoryMedia {
    pub fn new() -> Self {
        Self::default()
    }

    /// Content type and bytes of a stored object
    pub fn get(&self, key: &str) -> Option<(&str, &[u8])> {
        self.objects
            .get(key)
            .map(|(content_type, bytes)| (content_type.as_str(), bytes.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

impl MediaStore for MemoryMedia {
    fn put(&mut self, key: &str, bytes: &[u8], content_type: &str) -> Result<()> {
        self.objects
            .insert(key.to_string(), (content_type.to_string(), bytes.to_vec()));
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub use dir::DirMedia;

#[cfg(not(target_arch = "wasm32"))]
mod dir {
    use std::fs;
    use std::path::{Path, PathBuf};

    use super::MediaStore;
    use crate::error::StorageError;
    use crate::Result;

    /// Media written as plain files under a directory
    #[derive(Debug, Clone)]
    pub struct DirMedia {
        root: PathBuf,
    }

    impl DirMedia {
        pub fn new(root: impl Into<PathBuf>) -> Self {
            Self { root: root.into() }
        }

        pub fn root(&self) -> &Path {
            &self.root
        }
    }

    impl MediaStore for DirMedia {
        fn put(&mut self, key: &str, bytes: &[u8], content_type: &str) -> Result<()> {
            if key.split('/').any(|part| part.is_empty() || part == "..") {
                return Err(StorageError::Backend(format!("Invalid media key '{key}'")).into());
            }
            let path = self.root.join(key);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).map_err(StorageError::from)?;
            }
            fs::write(&path, bytes).map_err(StorageError::from)?;
            log::debug!("Wrote {} ({}, {} bytes)", path.display(), content_type, bytes.len());
            Ok(())
        }
    }
}

/// Extension after the last dot of `filename`; `jpg` when there is none or
/// it is not plain ASCII alphanumerics
pub fn file_extension(filename: &str) -> &str {
    match filename.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() && ext.bytes().all(|b| b.is_ascii_alphanumeric()) => ext,
        _ => "jpg",
    }
}

/// MIME type for an image extension; anything unknown is served as JPEG
pub fn content_type(extension: &str) -> &'static str {
    match extension.to_lowercase().as_str() {
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        _ => "image/jpeg",
    }
}

/// Random RFC 4122 version 4 UUID
pub fn uuid_v4<R: Rng + ?Sized>(rng: &mut R) -> String {
    let mut bytes = [0u8; 16];
    rng.fill(&mut bytes[..]);
    bytes[6] = (bytes[6] & 0x0f) | 0x40;
    bytes[8] = (bytes[8] & 0x3f) | 0x80;

    let hex: String = bytes.iter().map(|b| format!("{b:02x}")).collect();
    format!(
        "{}-{}-{}-{}-{}",
        &hex[0..8],
        &hex[8..12],
        &hex[12..16],
        &hex[16..20],
        &hex[20..32]
    )
}

/// Decode and store an image, returning its public URL
pub fn upload_image<M, R>(
    media: &mut M,
    request: &UploadRequest,
    cdn_base: &str,
    rng: &mut R,
) -> Result<UploadedImage>
where
    M: MediaStore + ?Sized,
    R: Rng + ?Sized,
{
    if request.image.trim().is_empty() {
        return Err(UploadError::NoImage.into());
    }

    // drop a data URL prefix such as "data:image/png;base64,"
    let payload = match request.image.split_once(',') {
        Some((_, rest)) => rest,
        None => request.image.as_str(),
    };
    let payload: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = STANDARD.decode(payload).map_err(UploadError::from)?;

    let filename = request
        .filename
        .as_deref()
        .filter(|f| !f.trim().is_empty())
        .unwrap_or(DEFAULT_FILENAME);
    let extension = file_extension(filename);
    let key = format!("{KEY_PREFIX}/{}.{extension}", uuid_v4(rng));

    media.put(&key, &bytes, content_type(extension))?;
    log::info!("Uploaded {} ({} bytes)", key, bytes.len());

    Ok(UploadedImage {
        url: format!("{}/{}", cdn_base.trim_end_matches('/'), key),
        filename: key,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    const CDN: &str = "https://cdn.example.com/shop";
    // "hello" in base64
    const HELLO: &str = "aGVsbG8=";

    fn rng() -> Pcg32 {
        Pcg32::seed_from_u64(42)
    }

    fn request(image: &str, filename: Option<&str>) -> UploadRequest {
        UploadRequest {
            image: image.to_string(),
            filename: filename.map(str::to_string),
        }
    }

    #[test]
    fn test_upload_plain_base64() {
        let mut media = MemoryMedia::new();
        let uploaded = upload_image(&mut media, &request(HELLO, None), CDN, &mut rng()).unwrap();

        assert!(uploaded.filename.starts_with("articles/"));
        assert!(uploaded.filename.ends_with(".jpg"));
        assert_eq!(uploaded.url, format!("{CDN}/{}", uploaded.filename));

        let (content_type, bytes) = media.get(&uploaded.filename).unwrap();
        assert_eq!(content_type, "image/jpeg");
        assert_eq!(bytes, b"hello");
    }

    #[test]
    fn test_upload_data_url() {
        let mut media = MemoryMedia::new();
        let image = format!("data:image/png;base64,{HELLO}");
        let uploaded =
            upload_image(&mut media, &request(&image, Some("shot.PNG")), CDN, &mut rng()).unwrap();

        assert!(uploaded.filename.ends_with(".PNG"));
        let (content_type, bytes) = media.get(&uploaded.filename).unwrap();
        assert_eq!(content_type, "image/png");
        assert_eq!(bytes, b"hello");
    }

    #[test]
    fn test_upload_errors() {
        let mut media = MemoryMedia::new();
        assert!(matches!(
            upload_image(&mut media, &request("  ", None), CDN, &mut rng()),
            Err(Error::Upload(UploadError::NoImage))
        ));
        assert!(matches!(
            upload_image(&mut media, &request("not base64!", None), CDN, &mut rng()),
            Err(Error::Upload(UploadError::InvalidBase64(_)))
        ));
        assert!(media.is_empty());
    }

    #[test]
    fn test_extension_and_content_type() {
        assert_eq!(file_extension("photo.webp"), "webp");
        assert_eq!(file_extension("archive.tar.gz"), "gz");
        assert_eq!(file_extension("noext"), "jpg");
        assert_eq!(file_extension("trailing."), "jpg");
        assert_eq!(file_extension("x.png/evil"), "jpg");
        assert_eq!(file_extension("x.png\\..\\evil"), "jpg");
        assert_eq!(content_type("GIF"), "image/gif");
        assert_eq!(content_type("bmp"), "image/jpeg");
    }

    #[test]
    fn test_upload_key_stays_flat() {
        let mut media = MemoryMedia::new();
        let uploaded =
            upload_image(&mut media, &request(HELLO, Some("x.png/evil")), CDN, &mut rng()).unwrap();

        let name = uploaded.filename.strip_prefix("articles/").unwrap();
        assert!(!name.contains('/'));
        assert!(name.ends_with(".jpg"));
    }

    #[test]
    fn test_uuid_v4_shape() {
        let mut rng = rng();
        let id = uuid_v4(&mut rng);
        let parts: Vec<&str> = id.split('-').collect();
        assert_eq!(parts.iter().map(|p| p.len()).collect::<Vec<_>>(), vec![8, 4, 4, 4, 12]);
        assert!(parts[2].starts_with('4'));
        assert!(matches!(parts[3].chars().next(), Some('8' | '9' | 'a' | 'b')));
        assert_ne!(id, uuid_v4(&mut rng));
    }

    #[test]
    fn test_dir_media_writes_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut media = DirMedia::new(dir.path());
        let uploaded = upload_image(&mut media, &request(HELLO, Some("a.gif")), CDN, &mut rng()).unwrap();

        let written = std::fs::read(dir.path().join(&uploaded.filename)).unwrap();
        assert_eq!(written, b"hello");
        assert!(media.put("../escape.jpg", b"x", "image/jpeg").is_err());
    }
}
