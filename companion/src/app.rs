//! Companion Application
//!
//! One task owns the animator, the rig and the chat session. The main loop
//! multiplexes three sources with `tokio::select!`:
//!
//! ```text
//! input lines ──► commands / chat sends ──► spawned relay requests
//!                                                   │
//! replies (mpsc) ◄──────────────────────────────────┘
//! frame ticks ──► animator.update(rig, delta)
//! ```
//!
//! Relay requests run on spawned tasks and report back over a channel, so
//! the animator never leaves this task.

use std::io::{self, Write};
use std::time::Duration;

use animator_core::{AvatarAnimator, Expression, JointName, MemoryRig};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::client::RelayClient;
use crate::session::{ChatSession, SendRejected};

/// Shown in place of a reply when a request fails
pub const APOLOGY: &str = "Sorry, something went wrong.";

/// Name used until the relay reports its persona
pub const DEFAULT_PERSONA: &str = "Avatar";

/// How long the talking smile stays on after a reply
pub const TALK_HOLD: Duration = Duration::from_secs(2);

/// A parsed input line
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Summon: play the wave gesture
    Wave,
    /// Print animator state
    Status,
    /// Leave the loop
    Quit,
    /// Anything else is sent to the relay
    Chat(String),
}

impl Command {
    /// Parse one input line; blank lines yield `None`
    #[must_use]
    pub fn parse(line: &str) -> Option<Self> {
        match line.trim() {
            "" => None,
            "/wave" => Some(Self::Wave),
            "/status" => Some(Self::Status),
            "/quit" | "/exit" => Some(Self::Quit),
            text => Some(Self::Chat(text.to_string())),
        }
    }
}

/// Companion settings
#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Animation frames per second
    pub fps: u32,
    /// Talking smile duration after each reply
    pub talk_hold: Duration,
    /// Blink schedule seed (entropy when `None`)
    pub seed: Option<u64>,
    /// Whether an avatar rig is loaded; chat works either way
    pub avatar: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            fps: 60,
            talk_hold: TALK_HOLD,
            seed: None,
            avatar: true,
        }
    }
}

type ChatResult = anyhow::Result<String>;

/// Terminal companion
pub struct CompanionApp<W: Write> {
    animator: AvatarAnimator,
    rig: Option<MemoryRig>,
    session: ChatSession,
    client: RelayClient,
    persona: String,
    out: W,
    frame_duration: Duration,
    talk_hold: Duration,
    talk_until: Option<Instant>,
    last_frame: Instant,
    replies_tx: mpsc::Sender<ChatResult>,
    replies_rx: mpsc::Receiver<ChatResult>,
    running: bool,
}

impl<W: Write> CompanionApp<W> {
    /// Create the app writing chat output to `out`
    pub fn new(client: RelayClient, config: &AppConfig, out: W) -> Self {
        let animator = match config.seed {
            Some(seed) => AvatarAnimator::seeded(seed),
            None => AvatarAnimator::new(),
        };
        let rig = config.avatar.then(MemoryRig::humanoid);
        let (replies_tx, replies_rx) = mpsc::channel(8);

        Self {
            animator,
            rig,
            session: ChatSession::new(),
            client,
            persona: DEFAULT_PERSONA.to_string(),
            out,
            frame_duration: Duration::from_secs_f64(1.0 / f64::from(config.fps.max(1))),
            talk_hold: config.talk_hold,
            talk_until: None,
            last_frame: Instant::now(),
            replies_tx,
            replies_rx,
            running: true,
        }
    }

    /// Probe the relay and adopt its persona name
    ///
    /// Returns `false` if the relay is unreachable; chat sends will then
    /// fail individually with the apology.
    pub async fn connect(&mut self) -> bool {
        match self.client.health().await {
            Ok(health) => {
                info!(character = %health.character, url = %self.client.base_url(), "Relay reachable");
                self.persona = health.character;
                true
            }
            Err(e) => {
                warn!(error = %e, url = %self.client.base_url(), "Relay not reachable");
                false
            }
        }
    }

    /// Main loop
    ///
    /// Runs until `/quit`, or until input closes and no reply is pending.
    ///
    /// # Errors
    ///
    /// Fails on input read errors or output write errors.
    pub async fn run<R>(&mut self, input: R) -> anyhow::Result<()>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut lines = input.lines();
        let mut input_open = true;

        let mut ticker = tokio::time::interval(self.frame_duration);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        self.last_frame = Instant::now();

        while self.running {
            tokio::select! {
                line = lines.next_line(), if input_open => {
                    match line? {
                        Some(line) => self.handle_line(&line)?,
                        None => {
                            debug!("Input closed");
                            input_open = false;
                        }
                    }
                }

                Some(result) = self.replies_rx.recv() => self.handle_reply(result)?,

                _ = ticker.tick() => self.frame(),
            }

            if !input_open && !self.session.is_in_flight() {
                self.running = false;
            }
        }

        self.finish();
        Ok(())
    }

    fn handle_line(&mut self, line: &str) -> io::Result<()> {
        match Command::parse(line) {
            None => Ok(()),
            Some(Command::Quit) => {
                self.running = false;
                Ok(())
            }
            Some(Command::Wave) => self.summon(),
            Some(Command::Status) => self.print_status(),
            Some(Command::Chat(text)) => self.send_chat(&text),
        }
    }

    fn send_chat(&mut self, text: &str) -> io::Result<()> {
        match self.session.begin(text) {
            Ok(history) => {
                let client = self.client.clone();
                let tx = self.replies_tx.clone();
                tokio::spawn(async move {
                    let result = client.chat(&history).await;
                    // Receiver is gone once the app has quit
                    let _ = tx.send(result).await;
                });
                Ok(())
            }
            Err(SendRejected::InFlight) => {
                writeln!(self.out, "({} is still thinking...)", self.persona)?;
                self.out.flush()
            }
            Err(SendRejected::Blank) => Ok(()),
        }
    }

    fn handle_reply(&mut self, result: ChatResult) -> io::Result<()> {
        match result {
            Ok(reply) => {
                writeln!(self.out, "{}> {}", self.persona, reply)?;
                self.session.complete(reply);
                if let Some(rig) = self.rig.as_mut() {
                    self.animator.play_talking_animation(rig);
                    self.talk_until = Some(Instant::now() + self.talk_hold);
                }
            }
            Err(e) => {
                warn!(error = %e, "Chat request failed");
                self.session.fail();
                writeln!(self.out, "{}> {}", self.persona, APOLOGY)?;
            }
        }
        self.out.flush()
    }

    fn summon(&mut self) -> io::Result<()> {
        match self.rig.as_mut() {
            Some(rig) => {
                if self.animator.play_wave_animation(rig) {
                    writeln!(self.out, "*{} waves*", self.persona)?;
                }
            }
            None => writeln!(self.out, "(no avatar loaded)")?,
        }
        self.out.flush()
    }

    fn print_status(&mut self) -> io::Result<()> {
        let Some(rig) = self.rig.as_ref() else {
            writeln!(self.out, "(no avatar loaded)")?;
            return self.out.flush();
        };

        let gesture = self
            .animator
            .wave_phase()
            .map_or_else(|| "idle".to_string(), |phase| format!("wave/{phase:?}"));
        writeln!(
            self.out,
            "blink={:?} ({:.2}) gesture={} happy={:.2} chest_y={:+.4}",
            self.animator.blink_phase(),
            rig.expression(Expression::Blink).unwrap_or_default(),
            gesture,
            rig.expression(Expression::Happy).unwrap_or_default(),
            rig.position(JointName::Chest).map_or(0.0, |p| p.y),
        )?;
        self.out.flush()
    }

    fn frame(&mut self) {
        let now = Instant::now();
        let delta = now.duration_since(self.last_frame).as_secs_f32();
        self.last_frame = now;

        let Some(rig) = self.rig.as_mut() else {
            return;
        };
        self.animator.update(rig, delta);

        if self.talk_until.is_some_and(|deadline| now >= deadline) {
            self.animator.stop_talking_animation(rig);
            self.talk_until = None;
        }
    }

    /// Put the avatar back at rest before leaving
    fn finish(&mut self) {
        if let Some(rig) = self.rig.as_mut() {
            self.animator.cancel_gesture(rig);
            if self.talk_until.take().is_some() {
                self.animator.stop_talking_animation(rig);
            }
        }
        debug!("Companion loop finished");
    }

    /// Conversation so far
    #[must_use]
    pub fn session(&self) -> &ChatSession {
        &self.session
    }

    /// The animator driving the rig
    #[must_use]
    pub fn animator(&self) -> &AvatarAnimator {
        &self.animator
    }

    /// The avatar rig, if one is loaded
    #[must_use]
    pub fn rig(&self) -> Option<&MemoryRig> {
        self.rig.as_ref()
    }

    /// Persona name in use
    #[must_use]
    pub fn persona(&self) -> &str {
        &self.persona
    }

    /// Output sink
    #[must_use]
    pub fn output(&self) -> &W {
        &self.out
    }
}
