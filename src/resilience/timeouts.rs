//! Timeout enforcement.
//!
//! # Responsibilities
//! - Bound the wait for upstream response headers (see `http::forwarder`)
//! - Abort response bodies that stall for longer than the idle timeout
//!
//! # Design Decisions
//! - Uses Tokio's timer facilities
//! - The header timeout never covers the body; long-lived streams are legal
//! - Idle timeout is reset by every frame, so a slow but steady feed survives
//! - An idle abort is a body error: the caller sees a truncated response

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use axum::BoxError;
use hyper::body::{Body, Frame, SizeHint};
use thiserror::Error;
use tokio::time::{Instant, Sleep};

/// The upstream body produced no frame within the idle limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("upstream body idle for {0:?}")]
pub struct BodyIdleTimeout(pub Duration);

/// Body wrapper that fails when `inner` stays pending for too long.
#[derive(Debug)]
pub struct IdleTimeoutBody<B> {
    inner: B,
    idle: Option<(Duration, Pin<Box<Sleep>>)>,
}

impl<B> IdleTimeoutBody<B> {
    /// Wrap `inner`; `None` disables the timer entirely.
    pub fn new(inner: B, idle: Option<Duration>) -> Self {
        Self {
            inner,
            idle: idle.map(|limit| (limit, Box::pin(tokio::time::sleep(limit)))),
        }
    }
}

impl<B> Body for IdleTimeoutBody<B>
where
    B: Body + Unpin,
    B::Error: Into<BoxError>,
{
    type Data = B::Data;
    type Error = BoxError;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = self.get_mut();

        match Pin::new(&mut this.inner).poll_frame(cx) {
            Poll::Ready(frame) => {
                if let Some((limit, sleep)) = this.idle.as_mut() {
                    sleep.as_mut().reset(Instant::now() + *limit);
                }
                Poll::Ready(frame.map(|result| result.map_err(Into::into)))
            }
            Poll::Pending => {
                if let Some((limit, sleep)) = this.idle.as_mut() {
                    if sleep.as_mut().poll(cx).is_ready() {
                        return Poll::Ready(Some(Err(BodyIdleTimeout(*limit).into())));
                    }
                }
                Poll::Pending
            }
        }
    }

    fn is_end_stream(&self) -> bool {
        self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}
