//! Streaming local files as parts of multipart requests.

use crate::errors::LabbcatError;
use fs_err::tokio::File;
use futures::StreamExt;
use reqwest::multipart::Part;
use reqwest::Body;
use std::io;
use std::path::Path;
use tokio_util::codec::{BytesCodec, FramedRead};
use tokio_util::sync::CancellationToken;

/// Create a part which streams the contents of a file, named after the file.
///
/// Once `cancel` is triggered, the stream fails, which aborts the request.
pub(crate) async fn file_part(
    path: &Path,
    cancel: &CancellationToken,
) -> Result<Part, LabbcatError> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .ok_or_else(|| LabbcatError::InvalidArgument(format!("Not a file: {}", path.display())))?;
    let file = File::open(path).await?;
    let content_length = fs_err::tokio::metadata(path).await?.len();
    let cancel = cancel.clone();
    let stream = FramedRead::new(file, BytesCodec::new()).map(move |chunk| {
        if cancel.is_cancelled() {
            Err(io::Error::new(io::ErrorKind::Interrupted, "upload cancelled"))
        } else {
            chunk
        }
    });
    Ok(Part::stream_with_length(Body::wrap_stream(stream), content_length).file_name(file_name))
}
