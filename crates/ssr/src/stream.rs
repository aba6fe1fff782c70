//! Ordered HTML stream assembly.
//!
//! One render produces one stream: the head, then the body, then the footer.
//! The stream is a lazy generator, so the HTTP transport pulls chunks at its
//! own pace and dropping the stream drops the body producer with it.

use bytes::{Bytes, BytesMut};
use futures_util::{future::BoxFuture, stream::BoxStream, FutureExt, Stream, StreamExt};

use crate::error::SsrError;

/// Chunks produced by a streaming renderer.
pub type ChunkStream = BoxStream<'static, Result<Bytes, SsrError>>;

/// Rendered page content.
pub enum RenderBody {
    /// Already rendered markup.
    Html(String),
    /// Markup that becomes available once, all at the end.
    Deferred(BoxFuture<'static, Result<String, SsrError>>),
    /// Markup produced progressively.
    Stream(ChunkStream),
}

impl RenderBody {
    pub fn html(html: impl Into<String>) -> Self {
        Self::Html(html.into())
    }

    pub fn deferred<F>(future: F) -> Self
    where
        F: std::future::Future<Output = Result<String, SsrError>> + Send + 'static,
    {
        Self::Deferred(future.boxed())
    }

    pub fn stream<S>(stream: S) -> Self
    where
        S: Stream<Item = Result<Bytes, SsrError>> + Send + 'static,
    {
        Self::Stream(stream.boxed())
    }
}

impl From<String> for RenderBody {
    fn from(html: String) -> Self {
        Self::Html(html)
    }
}

/// How body chunks are released.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamMode {
    /// Forward chunks as soon as the renderer produces them.
    ShellReady,
    /// Buffer the whole body and release it once rendering completes.
    AllReady,
}

impl StreamMode {
    /// Mode for a route context's `streaming` flag.
    pub fn from_streaming(streaming: bool) -> Self {
        if streaming {
            Self::ShellReady
        } else {
            Self::AllReady
        }
    }
}

/// Everything needed to assemble one page.
pub struct HtmlParts {
    pub head: String,
    pub body: Option<RenderBody>,
    pub footer: String,
}

/// Assemble `head`, `body` and `footer` into one ordered stream.
///
/// A body failure is yielded as the last item; the footer is not emitted after it.
pub fn generate_html_stream(
    parts: HtmlParts,
    mode: StreamMode,
) -> impl Stream<Item = Result<Bytes, SsrError>> + Send + 'static {
    let HtmlParts { head, body, footer } = parts;

    async_stream::stream! {
        yield Ok(Bytes::from(head));

        match body {
            None => {}
            Some(RenderBody::Html(html)) => {
                if !html.is_empty() {
                    yield Ok(Bytes::from(html));
                }
            }
            Some(RenderBody::Deferred(future)) => match future.await {
                Ok(html) => {
                    if !html.is_empty() {
                        yield Ok(Bytes::from(html));
                    }
                }
                Err(e) => {
                    tracing::error!(error = %e, "Deferred body failed, aborting response");
                    yield Err(e);
                    return;
                }
            },
            Some(RenderBody::Stream(mut chunks)) => match mode {
                StreamMode::ShellReady => {
                    while let Some(chunk) = chunks.next().await {
                        match chunk {
                            Ok(chunk) => yield Ok(chunk),
                            Err(e) => {
                                tracing::error!(error = %e, "Body stream failed, aborting response");
                                yield Err(e);
                                return;
                            }
                        }
                    }
                }
                StreamMode::AllReady => {
                    let mut buffer = BytesMut::new();
                    while let Some(chunk) = chunks.next().await {
                        match chunk {
                            Ok(chunk) => buffer.extend_from_slice(&chunk),
                            Err(e) => {
                                tracing::error!(error = %e, "Body failed before completion, aborting response");
                                yield Err(e);
                                return;
                            }
                        }
                    }
                    if !buffer.is_empty() {
                        yield Ok(buffer.freeze());
                    }
                }
            },
        }

        yield Ok(Bytes::from(footer));
    }
}
