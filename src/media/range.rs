use std::{io::SeekFrom, path::Path};

use anyhow::Context;
use axum::{
    body::Body,
    http::{header, StatusCode},
    response::Response,
};
use tokio::{
    fs::File,
    io::{AsyncReadExt, AsyncSeekExt},
};
use tokio_util::io::ReaderStream;
use tracing::debug;

use crate::error::AppError;

/// Inclusive byte range resolved against a file size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    pub fn content_range(&self, size: u64) -> String {
        format!("bytes {}-{}/{}", self.start, self.end, size)
    }
}

/// Parses a single `bytes=start-end`, `bytes=start-` or `bytes=-suffix`
/// range. Anything else, including multiple ranges and bounds past the
/// end of the file, is unsatisfiable.
pub fn parse_range(header: &str, size: u64) -> Result<ByteRange, AppError> {
    let unsatisfiable = || AppError::RangeNotSatisfiable { size };

    let ranges = header
        .trim()
        .strip_prefix("bytes=")
        .ok_or_else(unsatisfiable)?;
    if ranges.contains(',') {
        return Err(unsatisfiable());
    }
    let (start, end) = ranges.split_once('-').ok_or_else(unsatisfiable)?;
    let (start, end) = (start.trim(), end.trim());

    let range = if start.is_empty() {
        let suffix: u64 = end.parse().map_err(|_| unsatisfiable())?;
        if suffix == 0 || size == 0 {
            return Err(unsatisfiable());
        }
        ByteRange {
            start: size.saturating_sub(suffix),
            end: size - 1,
        }
    } else {
        let start: u64 = start.parse().map_err(|_| unsatisfiable())?;
        let end: u64 = if end.is_empty() {
            size.saturating_sub(1)
        } else {
            end.parse().map_err(|_| unsatisfiable())?
        };
        ByteRange { start, end }
    };

    if range.start >= size || range.end >= size || range.end < range.start {
        return Err(unsatisfiable());
    }
    Ok(range)
}

/// Serves `path` whole (200) or, given a `Range` header, the requested
/// slice (206). The body is streamed from disk.
pub async fn respond(path: &Path, range: Option<&str>) -> Result<Response, AppError> {
    let mut file = File::open(path).await?;
    let size = file.metadata().await.context("stat media file")?.len();
    let mime = mime_guess::from_path(path).first_or_octet_stream();

    let builder = Response::builder()
        .header(header::CONTENT_TYPE, mime.as_ref())
        .header(header::ACCEPT_RANGES, "bytes");

    let response = match range {
        None => builder
            .status(StatusCode::OK)
            .header(header::CONTENT_LENGTH, size)
            .body(Body::from_stream(ReaderStream::new(file))),
        Some(raw) => {
            let range = parse_range(raw, size)?;
            file.seek(SeekFrom::Start(range.start))
                .await
                .context("seek media file")?;
            debug!(start = range.start, end = range.end, size, "partial content");
            builder
                .status(StatusCode::PARTIAL_CONTENT)
                .header(header::CONTENT_RANGE, range.content_range(size))
                .header(header::CONTENT_LENGTH, range.len())
                .body(Body::from_stream(ReaderStream::new(file.take(range.len()))))
        }
    };
    response.map_err(|e| AppError::Internal(e.into()))
}

#[cfg(test)]
mod tests {
    use axum::body::to_bytes;

    use super::*;

    fn thousand_bytes() -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("1.mp3");
        let data: Vec<u8> = (0..1000u32).map(|i| (i % 251) as u8).collect();
        std::fs::write(&path, data).unwrap();
        (dir, path)
    }

    #[test]
    fn parses_single_ranges() {
        assert_eq!(
            parse_range("bytes=0-99", 1000).unwrap(),
            ByteRange { start: 0, end: 99 }
        );
        assert_eq!(
            parse_range("bytes=900-", 1000).unwrap(),
            ByteRange { start: 900, end: 999 }
        );
        assert_eq!(
            parse_range("bytes=-100", 1000).unwrap(),
            ByteRange { start: 900, end: 999 }
        );
        assert_eq!(
            parse_range("bytes=-5000", 1000).unwrap(),
            ByteRange { start: 0, end: 999 }
        );
    }

    #[test]
    fn rejects_unsatisfiable_ranges() {
        for raw in [
            "bytes=1000-1005",
            "bytes=0-1000",
            "bytes=50-10",
            "bytes=0-9,20-29",
            "bytes=abc-",
            "items=0-9",
            "bytes=-0",
        ] {
            assert!(
                matches!(parse_range(raw, 1000), Err(AppError::RangeNotSatisfiable { size: 1000 })),
                "{raw} should be unsatisfiable"
            );
        }
        assert!(parse_range("bytes=0-", 0).is_err());
    }

    #[tokio::test]
    async fn first_hundred_bytes_are_partial_content() {
        let (_dir, path) = thousand_bytes();
        let res = respond(&path, Some("bytes=0-99")).await.unwrap();
        assert_eq!(res.status(), StatusCode::PARTIAL_CONTENT);
        assert_eq!(res.headers()[header::CONTENT_RANGE], "bytes 0-99/1000");
        assert_eq!(res.headers()[header::CONTENT_LENGTH], "100");
        assert_eq!(res.headers()[header::ACCEPT_RANGES], "bytes");
        assert_eq!(res.headers()[header::CONTENT_TYPE], "audio/mpeg");

        let body = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        assert_eq!(body.len(), 100);
        assert_eq!(body[..], std::fs::read(&path).unwrap()[..100]);
    }

    #[tokio::test]
    async fn last_hundred_bytes() {
        let (_dir, path) = thousand_bytes();
        let res = respond(&path, Some("bytes=900-999")).await.unwrap();
        assert_eq!(res.headers()[header::CONTENT_RANGE], "bytes 900-999/1000");
        let body = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        assert_eq!(body[..], std::fs::read(&path).unwrap()[900..]);
    }

    #[tokio::test]
    async fn range_past_the_end_is_416() {
        let (_dir, path) = thousand_bytes();
        let err = respond(&path, Some("bytes=1000-1005")).await.unwrap_err();
        assert!(matches!(err, AppError::RangeNotSatisfiable { size: 1000 }));
    }

    #[tokio::test]
    async fn no_range_serves_the_whole_file() {
        let (_dir, path) = thousand_bytes();
        let res = respond(&path, None).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.headers()[header::CONTENT_LENGTH], "1000");
        let body = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        assert_eq!(body.len(), 1000);
    }

    #[tokio::test]
    async fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = respond(&dir.path().join("404.mp3"), None).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
