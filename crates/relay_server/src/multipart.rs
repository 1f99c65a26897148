//! `multipart/x-mixed-replace` part encoding
//!
//! Each frame is written as
//! `--{boundary}\r\nContent-Type: {content_type}\r\n\r\n{bytes}\r\n`.

use bytes::{BufMut, Bytes, BytesMut};
use contracts::Frame;

/// Encodes frames as multipart parts
#[derive(Debug, Clone)]
pub struct MultipartEncoder {
    header: Bytes,
    response_content_type: String,
}

impl MultipartEncoder {
    pub fn new(boundary: &str, content_type: &str) -> Self {
        let header = Bytes::from(format!(
            "--{boundary}\r\nContent-Type: {content_type}\r\n\r\n"
        ));
        Self {
            header,
            response_content_type: format!("multipart/x-mixed-replace; boundary={boundary}"),
        }
    }

    /// `Content-Type` of the whole streaming response
    pub fn response_content_type(&self) -> &str {
        &self.response_content_type
    }

    /// One complete part carrying `frame`
    pub fn encode(&self, frame: &Frame) -> Bytes {
        let mut part = BytesMut::with_capacity(self.header.len() + frame.len() + 2);
        part.put_slice(&self.header);
        part.put_slice(frame);
        part.put_slice(b"\r\n");
        part.freeze()
    }
}

impl Default for MultipartEncoder {
    fn default() -> Self {
        Self::new("frame", "image/jpeg")
    }
}
