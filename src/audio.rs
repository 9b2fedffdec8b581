//! Microphone input using Web Audio API
//!
//! `getUserMedia` → MediaStreamSource → Analyser → ScriptProcessor → destination.
//! The script processor hands each input buffer (channel 0) to the consumer.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{
    AnalyserNode, AudioContext, AudioContextState, AudioProcessingEvent, MediaStream,
    MediaStreamAudioSourceNode, MediaStreamConstraints, MediaStreamTrack, ScriptProcessorNode,
};

use crate::error::{GameError, describe_js};
use crate::platform::{AudioInput, Subscription};

/// Live processing graph, kept alive until cancelled
struct Graph {
    ctx: AudioContext,
    stream: MediaStream,
    source: MediaStreamAudioSourceNode,
    analyser: AnalyserNode,
    processor: ScriptProcessorNode,
    _on_process: Closure<dyn FnMut(AudioProcessingEvent)>,
}

impl Graph {
    fn build(
        stream: MediaStream,
        buffer_size: u32,
        mut on_buffer: Box<dyn FnMut(&[f32])>,
    ) -> Result<Self, JsValue> {
        let ctx = AudioContext::new()?;
        // Autoplay policy may create the context suspended
        if ctx.state() == AudioContextState::Suspended {
            let _ = ctx.resume();
        }
        let source = ctx.create_media_stream_source(&stream)?;
        let analyser = ctx.create_analyser()?;
        let processor = ctx
            .create_script_processor_with_buffer_size_and_number_of_input_channels_and_number_of_output_channels(
                buffer_size,
                1,
                1,
            )?;

        let on_process = Closure::<dyn FnMut(AudioProcessingEvent)>::new(
            move |event: AudioProcessingEvent| {
                let samples = event
                    .input_buffer()
                    .and_then(|buffer| buffer.get_channel_data(0));
                match samples {
                    Ok(samples) => on_buffer(&samples),
                    Err(e) => log::warn!("Dropped audio buffer: {}", describe_js(&e)),
                }
            },
        );
        processor.set_onaudioprocess(Some(on_process.as_ref().unchecked_ref()));

        source.connect_with_audio_node(&analyser)?;
        analyser.connect_with_audio_node(&processor)?;
        processor.connect_with_audio_node(&ctx.destination())?;

        Ok(Self {
            ctx,
            stream,
            source,
            analyser,
            processor,
            _on_process: on_process,
        })
    }

    fn teardown(&self) {
        self.processor.set_onaudioprocess(None);
        let _ = self.source.disconnect();
        let _ = self.analyser.disconnect();
        let _ = self.processor.disconnect();
        let _ = self.ctx.close();
        for track in self.stream.get_audio_tracks().iter() {
            if let Ok(track) = track.dyn_into::<MediaStreamTrack>() {
                track.stop();
            }
        }
    }
}

/// Microphone access through `navigator.mediaDevices`
#[derive(Debug, Default)]
pub struct Microphone;

impl Microphone {
    pub fn new() -> Self {
        Self
    }
}

/// Cancels a pending request or tears down the live graph
struct MicSubscription {
    cancelled: Rc<Cell<bool>>,
    graph: Rc<RefCell<Option<Graph>>>,
}

impl Subscription for MicSubscription {
    fn cancel(&mut self) {
        if self.cancelled.replace(true) {
            return;
        }
        if let Some(graph) = self.graph.borrow_mut().take() {
            graph.teardown();
            log::info!("Microphone released");
        }
    }
}

impl AudioInput for Microphone {
    fn open(
        &mut self,
        buffer_size: u32,
        on_buffer: Box<dyn FnMut(&[f32])>,
        on_error: Box<dyn FnOnce(GameError)>,
    ) -> Result<Box<dyn Subscription>, GameError> {
        let unavailable = |e: JsValue| GameError::AudioUnavailable(describe_js(&e));

        let window = web_sys::window().ok_or(GameError::AudioUnavailable("no window".into()))?;
        let devices = window.navigator().media_devices().map_err(unavailable)?;

        let constraints = MediaStreamConstraints::new();
        constraints.set_audio(&JsValue::TRUE);
        let request = devices
            .get_user_media_with_constraints(&constraints)
            .map_err(unavailable)?;

        let cancelled = Rc::new(Cell::new(false));
        let graph = Rc::new(RefCell::new(None));

        {
            let cancelled = cancelled.clone();
            let graph = graph.clone();
            wasm_bindgen_futures::spawn_local(async move {
                let stream = match JsFuture::from(request).await {
                    Ok(stream) => stream,
                    Err(e) => {
                        if !cancelled.get() {
                            on_error(unavailable(e));
                        }
                        return;
                    }
                };
                let stream: MediaStream = match stream.dyn_into() {
                    Ok(stream) => stream,
                    Err(_) => {
                        if !cancelled.get() {
                            on_error(GameError::AudioUnavailable("not a media stream".into()));
                        }
                        return;
                    }
                };
                log::info!("Got microphone stream");

                match Graph::build(stream.clone(), buffer_size, on_buffer) {
                    Ok(live) => {
                        if cancelled.get() {
                            // Stopped while the permission prompt was open
                            live.teardown();
                        } else {
                            *graph.borrow_mut() = Some(live);
                        }
                    }
                    Err(e) => {
                        for track in stream.get_audio_tracks().iter() {
                            if let Ok(track) = track.dyn_into::<MediaStreamTrack>() {
                                track.stop();
                            }
                        }
                        on_error(unavailable(e));
                    }
                }
            });
        }

        Ok(Box::new(MicSubscription { cancelled, graph }))
    }
}
