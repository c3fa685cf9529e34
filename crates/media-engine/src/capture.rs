// FILE: crates/media-engine/src/capture.rs
//! Microphone capture through cpal, stored as 16-bit PCM WAV
//!
//! cpal streams cannot move between threads, so each take owns a capture
//! thread that opens the device, writes every sample block it receives and
//! finalizes the file when told to stop.

use async_trait::async_trait;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SampleFormat, SizedSample, StreamConfig};
use hound::{WavSpec, WavWriter};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Mutex, MutexGuard};
use tokio::sync::oneshot;
use verserec_sync_engine::{AudioCapture, CaptureError};

type TakeWriter = WavWriter<BufWriter<File>>;

enum Message {
    Samples(Vec<i16>),
    Stop,
}

struct Running {
    messages: Sender<Message>,
    done: oneshot::Receiver<Result<u32, CaptureError>>,
}

/// [`AudioCapture`] on the host's input device
pub struct MicrophoneCapture {
    device: Option<String>,
    running: Mutex<Option<Running>>,
}

impl MicrophoneCapture {
    /// Records from the default input device
    pub fn new() -> Self {
        Self::with_device(None)
    }

    /// Records from the input device called `name`, or the default one
    pub fn with_device(name: Option<String>) -> Self {
        Self {
            device: name,
            running: Mutex::new(None),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Option<Running>>, CaptureError> {
        self.running
            .lock()
            .map_err(|_| CaptureError::Device("capture state poisoned".to_string()))
    }
}

impl Default for MicrophoneCapture {
    fn default() -> Self {
        Self::new()
    }
}

/// Names of the host's input devices
pub fn input_devices() -> Result<Vec<String>, CaptureError> {
    let devices = cpal::default_host()
        .input_devices()
        .map_err(|e| classify(e.to_string()))?;
    Ok(devices.filter_map(|device| device.name().ok()).collect())
}

#[async_trait]
impl AudioCapture for MicrophoneCapture {
    async fn start(&self, destination: &Path) -> Result<(), CaptureError> {
        if self.lock()?.is_some() {
            return Err(CaptureError::Device("capture already running".to_string()));
        }

        let (messages, inbox) = mpsc::channel();
        let (ready_tx, ready_rx) = oneshot::channel();
        let (done_tx, done_rx) = oneshot::channel();
        let device = self.device.clone();
        let destination = destination.to_path_buf();
        let stream_messages = messages.clone();

        std::thread::Builder::new()
            .name("verserec-capture".to_string())
            .spawn(move || {
                capture_thread(device, destination, stream_messages, inbox, ready_tx, done_tx)
            })
            .map_err(|e| CaptureError::Device(format!("no capture thread: {}", e)))?;

        ready_rx
            .await
            .map_err(|_| CaptureError::Device("capture thread exited".to_string()))??;

        *self.lock()? = Some(Running {
            messages,
            done: done_rx,
        });
        Ok(())
    }

    async fn stop(&self) -> Result<(), CaptureError> {
        let running = self
            .lock()?
            .take()
            .ok_or_else(|| CaptureError::Device("no capture running".to_string()))?;

        // The thread may already be gone after a stream error
        let _ = running.messages.send(Message::Stop);
        let frames = running
            .done
            .await
            .map_err(|_| CaptureError::Device("capture thread exited".to_string()))??;
        log::debug!("Capture finished after {} frames", frames);
        Ok(())
    }
}

fn capture_thread(
    device: Option<String>,
    destination: PathBuf,
    stream_messages: Sender<Message>,
    inbox: Receiver<Message>,
    ready: oneshot::Sender<Result<(), CaptureError>>,
    done: oneshot::Sender<Result<u32, CaptureError>>,
) {
    let opened = open_device(device.as_deref()).and_then(|device| {
        let supported = device
            .default_input_config()
            .map_err(|e| classify(e.to_string()))?;
        let spec = WavSpec {
            channels: supported.channels(),
            sample_rate: supported.sample_rate().0,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let writer = WavWriter::create(&destination, spec)
            .map_err(|e| CaptureError::Device(format!("{}: {}", destination.display(), e)))?;

        let config: StreamConfig = supported.config();
        let stream = match supported.sample_format() {
            SampleFormat::F32 => input_stream::<f32>(&device, &config, stream_messages),
            SampleFormat::I16 => input_stream::<i16>(&device, &config, stream_messages),
            SampleFormat::U16 => input_stream::<u16>(&device, &config, stream_messages),
            SampleFormat::I32 => input_stream::<i32>(&device, &config, stream_messages),
            other => Err(CaptureError::Device(format!("unsupported sample format {}", other))),
        }?;
        stream.play().map_err(|e| classify(e.to_string()))?;

        log::info!(
            "Capturing {} ch at {} Hz into {}",
            spec.channels,
            spec.sample_rate,
            destination.display()
        );
        Ok((stream, writer))
    });

    let (stream, mut writer) = match opened {
        Ok(opened) => opened,
        Err(e) => {
            let _ = ready.send(Err(e));
            return;
        }
    };
    if ready.send(Ok(())).is_err() {
        return;
    }

    let written = write_until_stop(&inbox, &mut writer);
    drop(stream);
    let result = written.and_then(|()| finish(&inbox, writer));
    let _ = done.send(result);
}

fn open_device(name: Option<&str>) -> Result<cpal::Device, CaptureError> {
    let host = cpal::default_host();
    match name {
        None => host
            .default_input_device()
            .ok_or_else(|| CaptureError::Device("no default input device".to_string())),
        Some(name) => host
            .input_devices()
            .map_err(|e| classify(e.to_string()))?
            .find(|device| device.name().is_ok_and(|found| found == name))
            .ok_or_else(|| CaptureError::Device(format!("no input device named '{}'", name))),
    }
}

fn input_stream<T>(
    device: &cpal::Device,
    config: &StreamConfig,
    messages: Sender<Message>,
) -> Result<cpal::Stream, CaptureError>
where
    T: SizedSample,
    i16: FromSample<T>,
{
    device
        .build_input_stream(
            config,
            move |data: &[T], _: &cpal::InputCallbackInfo| {
                let block = data.iter().map(|&sample| sample.to_sample::<i16>()).collect();
                let _ = messages.send(Message::Samples(block));
            },
            |e| log::error!("Input stream error: {}", e),
            None,
        )
        .map_err(|e| classify(e.to_string()))
}

/// Hosts report a refused microphone as a backend message
fn classify(message: String) -> CaptureError {
    let lower = message.to_lowercase();
    if lower.contains("permission") || lower.contains("access denied") {
        CaptureError::PermissionDenied(message)
    } else {
        CaptureError::Device(message)
    }
}

fn write_block(writer: &mut TakeWriter, block: &[i16]) -> Result<(), CaptureError> {
    for &sample in block {
        writer
            .write_sample(sample)
            .map_err(|e| CaptureError::Device(format!("write failed: {}", e)))?;
    }
    Ok(())
}

/// Writes sample blocks until a stop request or until every sender is gone
fn write_until_stop(inbox: &Receiver<Message>, writer: &mut TakeWriter) -> Result<(), CaptureError> {
    while let Ok(message) = inbox.recv() {
        match message {
            Message::Samples(block) => write_block(writer, &block)?,
            Message::Stop => break,
        }
    }
    Ok(())
}

/// Writes what the closed stream left behind and finalizes the header
fn finish(inbox: &Receiver<Message>, mut writer: TakeWriter) -> Result<u32, CaptureError> {
    while let Ok(message) = inbox.try_recv() {
        if let Message::Samples(block) = message {
            write_block(&mut writer, &block)?;
        }
    }
    let channels = u32::from(writer.spec().channels.max(1));
    let frames = writer.len() / channels;
    writer
        .finalize()
        .map_err(|e| CaptureError::Device(format!("finalize failed: {}", e)))?;
    Ok(frames)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::probe;
    use tempfile::TempDir;

    fn writer(path: &Path) -> TakeWriter {
        let spec = WavSpec {
            channels: 1,
            sample_rate: 8000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        WavWriter::create(path, spec).unwrap()
    }

    #[test]
    fn test_blocks_after_stop_still_land_in_the_take() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("take.m4a.partial");
        let mut take = writer(&path);
        let (tx, rx) = mpsc::channel();

        tx.send(Message::Samples(vec![100; 4000])).unwrap();
        tx.send(Message::Stop).unwrap();
        tx.send(Message::Samples(vec![-100; 4000])).unwrap();

        write_until_stop(&rx, &mut take).unwrap();
        assert_eq!(finish(&rx, take).unwrap(), 8000);

        let info = probe(&path).unwrap();
        assert_eq!(info.sample_rate, 8000);
        assert_eq!(info.channels, 1);
        let seconds = info.duration.unwrap().as_secs_f64();
        assert!((seconds - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_writer_stops_when_the_stream_is_gone() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("take.wav");
        let mut take = writer(&path);
        let (tx, rx) = mpsc::channel();
        tx.send(Message::Samples(vec![1, 2, 3])).unwrap();
        drop(tx);

        write_until_stop(&rx, &mut take).unwrap();
        assert_eq!(finish(&rx, take).unwrap(), 3);
    }

    #[test]
    fn test_refused_microphone_is_a_permission_error() {
        assert!(matches!(
            classify("Permission denied (os error 13)".to_string()),
            CaptureError::PermissionDenied(_)
        ));
        assert!(matches!(
            classify("device busy".to_string()),
            CaptureError::Device(_)
        ));
    }

    #[tokio::test]
    async fn test_stop_without_start() {
        let capture = MicrophoneCapture::new();
        assert!(matches!(
            capture.stop().await,
            Err(CaptureError::Device(_))
        ));
    }
}
