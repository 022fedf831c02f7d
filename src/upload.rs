//! Turning a picked image file into something the document can reference.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use base64::{Engine, engine::general_purpose::STANDARD};
use mime_sniffer::MimeTypeSniffer;

use crate::config::{ImageSettings, ImageSource};
use crate::error::UploadError;

/// An image file that passed validation, ready for `insert_image`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PreparedImage {
    pub name: String,
    pub mime_type: String,
    pub src: String,
}

pub fn read_image(path: &Path, settings: &ImageSettings) -> Result<PreparedImage, UploadError> {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let metadata = fs::metadata(path).map_err(|source| UploadError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    if metadata.len() > settings.max_bytes {
        return Err(UploadError::TooLarge {
            name,
            size: metadata.len(),
            limit: settings.max_bytes,
        });
    }

    let bytes = fs::read(path).map_err(|source| UploadError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let mime_type = bytes
        .as_slice()
        .sniff_mime_type()
        .unwrap_or("application/octet-stream")
        .to_string();
    if !mime_type.starts_with("image/") {
        tracing::info!(%name, %mime_type, "rejected non-image file");
        return Err(UploadError::NotAnImage { name, mime_type });
    }

    let src = match settings.source {
        ImageSource::Embed => format!("data:{};base64,{}", mime_type, STANDARD.encode(&bytes)),
        ImageSource::Upload => store_image(&name, &bytes, settings)?,
    };
    tracing::debug!(%name, %mime_type, size = bytes.len(), "prepared image");
    Ok(PreparedImage {
        name,
        mime_type,
        src,
    })
}

fn store_image(name: &str, bytes: &[u8], settings: &ImageSettings) -> Result<String, UploadError> {
    let dir = &settings.upload_dir;
    let store_error = |source| UploadError::Store {
        name: name.to_string(),
        dir: dir.clone(),
        source,
    };
    fs::create_dir_all(dir).map_err(store_error)?;
    fs::write(dir.join(name), bytes).map_err(store_error)?;
    Ok(format!("{}/{}", settings.base_url.trim_end_matches('/'), name))
}

/// Reads an image on a worker thread so the event loop keeps running.
pub struct ImageLoader {
    path: PathBuf,
    receiver: Receiver<Result<PreparedImage, UploadError>>,
}

impl ImageLoader {
    pub fn spawn(path: PathBuf, settings: ImageSettings) -> Self {
        let (sender, receiver) = mpsc::channel();
        let worker_path = path.clone();
        thread::spawn(move || {
            let result = read_image(&worker_path, &settings);
            // The receiver may be gone if the user quit meanwhile.
            let _ = sender.send(result);
        });
        Self { path, receiver }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `None` while the worker is still busy.
    pub fn poll(&self) -> Option<Result<PreparedImage, UploadError>> {
        match self.receiver.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(UploadError::Interrupted)),
        }
    }

    /// Blocks until the worker is done.
    pub fn wait(self) -> Result<PreparedImage, UploadError> {
        self.receiver.recv().unwrap_or(Err(UploadError::Interrupted))
    }
}
