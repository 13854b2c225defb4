//! The outbound pump: mailbox → socket.

use std::time::Duration;

use parley_protocol::{Codec, Event};
use parley_transport::FrameWriter;
use tokio::io::AsyncWrite;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::{Mailbox, SessionConfig, SessionError};

/// Drains `mailbox` onto `writer` in enqueue order.
///
/// Each write gets `config.write_timeout`. If nothing has been written for
/// `config.ping_interval`, a `ping` goes out instead. Returns when
/// `cancel` fires or the mailbox is closed and empty; returns an error on
/// the first failed or timed-out write.
pub async fn run_outbound<W, C>(
    mut mailbox: Mailbox,
    mut writer: FrameWriter<W>,
    codec: &C,
    config: &SessionConfig,
    cancel: CancellationToken,
) -> Result<(), SessionError>
where
    W: AsyncWrite + Unpin,
    C: Codec,
{
    let period = config.ping_interval;
    let mut keepalive = tokio::time::interval_at(Instant::now() + period, period);
    keepalive.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let result = loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break Ok(()),
            next = mailbox.recv() => match next {
                Some(event) => {
                    if let Err(e) = write_event(&mut writer, codec, &event, config.write_timeout).await {
                        break Err(e);
                    }
                    keepalive.reset();
                }
                None => break Ok(()),
            },
            _ = keepalive.tick() => {
                if let Err(e) = write_event(&mut writer, codec, &Event::Ping, config.write_timeout).await {
                    break Err(e);
                }
            }
        }
    };

    // Flush and half-close; the peer may already be gone.
    let _ = tokio::time::timeout(config.write_timeout, writer.close()).await;
    result
}

/// Encodes and writes one event under a deadline.
pub async fn write_event<W, C>(
    writer: &mut FrameWriter<W>,
    codec: &C,
    event: &Event,
    deadline: Duration,
) -> Result<(), SessionError>
where
    W: AsyncWrite + Unpin,
    C: Codec,
{
    let bytes = codec.encode(&event.to_envelope()?)?;
    match tokio::time::timeout(deadline, writer.send(&bytes)).await {
        Ok(result) => result.map_err(SessionError::from),
        Err(_) => Err(SessionError::WriteTimeout(deadline)),
    }
}
