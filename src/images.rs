use std::fmt::Display;
use std::io;
use std::path::{Path, PathBuf};

use actix_web::web::Bytes;
use chrono::Utc;
use futures::{pin_mut, Stream, StreamExt};
use thiserror::Error;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::db::DEFAULT_IMAGE;

const CREATE_ATTEMPTS: usize = 4;

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("image store I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("upload interrupted: {0}")]
    Upload(String),
}

/// Product images on local disk, served publicly under `/imagenes`.
#[derive(Debug, Clone)]
pub struct ImageStore {
    dir: PathBuf,
}

impl ImageStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_of(&self, filename: &str) -> PathBuf {
        self.dir.join(filename)
    }

    pub async fn ensure_dir(&self) -> io::Result<()> {
        tokio::fs::create_dir_all(&self.dir).await
    }

    /// Writes `chunks` under a freshly generated name and returns that name.
    /// A failed stream leaves nothing behind.
    pub async fn save_stream<S, E>(&self, original_name: &str, chunks: S) -> Result<String, ImageError>
    where
        S: Stream<Item = Result<Bytes, E>>,
        E: Display,
    {
        let (filename, mut file) = self.create_unique(original_name).await?;
        let path = self.path_of(&filename);

        pin_mut!(chunks);
        let written: Result<(), ImageError> = async {
            while let Some(chunk) = chunks.next().await {
                let chunk = chunk.map_err(|e| ImageError::Upload(e.to_string()))?;
                file.write_all(&chunk).await?;
            }
            file.flush().await?;
            Ok(())
        }
        .await;

        if let Err(err) = written {
            drop(file);
            if let Err(cleanup) = tokio::fs::remove_file(&path).await {
                log::error!("Error al eliminar imagen parcial {}: {}", filename, cleanup);
            }
            return Err(err);
        }
        Ok(filename)
    }

    /// Opens a new file that no other upload owns. A name already on disk
    /// gets a random tag instead of being truncated.
    async fn create_unique(&self, original_name: &str) -> Result<(String, File), ImageError> {
        let base = generate_filename(original_name);
        let mut filename = base.clone();
        for _ in 0..CREATE_ATTEMPTS {
            match OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(self.path_of(&filename))
                .await
            {
                Ok(file) => return Ok((filename, file)),
                Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
                    filename = disambiguate(&base);
                }
                Err(err) => return Err(err.into()),
            }
        }
        Err(io::Error::new(io::ErrorKind::AlreadyExists, filename).into())
    }

    /// Deletes a stored image. The shared default image is never removed.
    pub async fn remove(&self, filename: &str) -> io::Result<()> {
        if filename == DEFAULT_IMAGE {
            return Ok(());
        }
        tokio::fs::remove_file(self.path_of(filename)).await
    }
}

/// `<unix millis>-<client file name>`, keeping only the last path component
/// and replacing anything outside `[A-Za-z0-9._-]`.
pub fn generate_filename(original_name: &str) -> String {
    let base = original_name
        .rsplit(|c: char| c == '/' || c == '\\')
        .next()
        .unwrap_or_default();
    let mut clean: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if clean.is_empty() {
        clean.push_str("imagen");
    }
    format!("{}-{}", Utc::now().timestamp_millis(), clean)
}

/// `<millis>-<name>` becomes `<millis>-<8 hex chars>-<name>`.
fn disambiguate(filename: &str) -> String {
    let tag = Uuid::new_v4().simple().to_string();
    match filename.split_once('-') {
        Some((millis, rest)) => format!("{}-{}-{}", millis, &tag[..8], rest),
        None => format!("{}-{}", &tag[..8], filename),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    #[test]
    fn filename_keeps_only_last_component() {
        let name = generate_filename("../../etc/pass wd.png");
        let (millis, rest) = name.split_once('-').unwrap();
        assert!(millis.parse::<i64>().is_ok());
        assert_eq!(rest, "pass_wd.png");
        assert!(generate_filename("C:\\fotos\\remera.jpg").ends_with("-remera.jpg"));
        assert!(generate_filename("").ends_with("-imagen"));
    }

    #[actix_web::test]
    async fn save_stream_writes_every_chunk() {
        let dir = tempfile::tempdir().unwrap();
        let store = ImageStore::new(dir.path());
        let chunks = stream::iter(vec![
            Ok::<_, io::Error>(Bytes::from_static(b"abc")),
            Ok(Bytes::from_static(b"def")),
        ]);

        let name = store.save_stream("foto.jpg", chunks).await.unwrap();

        assert!(name.ends_with("-foto.jpg"));
        assert_eq!(std::fs::read(store.path_of(&name)).unwrap(), b"abcdef");
    }

    #[actix_web::test]
    async fn failed_stream_removes_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = ImageStore::new(dir.path());
        let chunks = stream::iter(vec![
            Ok(Bytes::from_static(b"abc")),
            Err(io::Error::new(io::ErrorKind::ConnectionReset, "reset")),
        ]);

        let result = store.save_stream("foto.jpg", chunks).await;

        assert!(matches!(result, Err(ImageError::Upload(_))));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[actix_web::test]
    async fn same_name_twice_gets_distinct_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = ImageStore::new(dir.path());
        let chunks = |body: &'static [u8]| stream::iter(vec![Ok::<_, io::Error>(Bytes::from_static(body))]);

        let mut names = Vec::new();
        for _ in 0..20 {
            names.push(store.save_stream("foto.jpg", chunks(b"first")).await.unwrap());
            names.push(store.save_stream("foto.jpg", chunks(b"second")).await.unwrap());
        }

        let mut unique = names.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), names.len());
        for pair in names.chunks(2) {
            assert_eq!(std::fs::read(store.path_of(&pair[0])).unwrap(), b"first");
            assert!(pair[1].ends_with("-foto.jpg"));
            store.remove(&pair[1]).await.unwrap();
            assert!(store.path_of(&pair[0]).exists());
        }
    }

    #[test]
    fn disambiguate_keeps_millis_and_name() {
        let name = disambiguate("1700000000000-foto.jpg");
        let parts: Vec<&str> = name.splitn(3, '-').collect();
        assert_eq!(parts[0], "1700000000000");
        assert_eq!(parts[1].len(), 8);
        assert_eq!(parts[2], "foto.jpg");
    }

    #[actix_web::test]
    async fn remove_never_touches_default_image() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(DEFAULT_IMAGE), b"x").unwrap();
        let store = ImageStore::new(dir.path());

        store.remove(DEFAULT_IMAGE).await.unwrap();

        assert!(dir.path().join(DEFAULT_IMAGE).exists());
    }
}
