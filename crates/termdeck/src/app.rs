//! The event loop: one queue of [`Message`]s drives a [`Controller`], which
//! owns the deck and the viewport.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use crossbeam_channel::{Receiver, Sender, after, never, select};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::config::Config;
use crate::deck::Deck;
use crate::messages::{Command, Message};
use crate::parser::load_deck;
use crate::style::place;
use crate::terminal::{self, Screen};
use crate::transition::spring::FPS;
use crate::watch::{HotReload, WatchTargets};

/// Runtime options from the command line.
#[derive(Debug, Clone, Default)]
pub struct Options {
    pub watch: bool,
    pub config: Option<PathBuf>,
}

/// Owns the deck and the viewport size, and turns messages into state
/// changes plus follow-up commands.
pub struct Controller {
    deck: Deck,
    width: usize,
    height: usize,
    /// Bumped on every deck replacement so ticks scheduled for the old
    /// deck can be recognised.
    generation: u64,
}

impl Controller {
    pub fn new(deck: Deck) -> Self {
        Self {
            deck,
            width: 0,
            height: 0,
            generation: 0,
        }
    }

    pub fn deck(&self) -> &Deck {
        &self.deck
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn update(&mut self, message: Message) -> Option<Command> {
        match message {
            Message::Resize { width, height } => {
                self.width = usize::from(width);
                self.height = usize::from(height);
                self.deck.resize(self.width, self.height);
                None
            }
            Message::Advance => {
                if !self.deck.advance() {
                    return None;
                }
                self.animate()
            }
            Message::Retreat => {
                if !self.deck.retreat() {
                    return None;
                }
                self.animate()
            }
            Message::FrameTick { generation } => {
                if generation != self.generation {
                    log::trace!("Dropping tick for replaced deck {generation}");
                    return None;
                }
                self.deck.tick()
            }
            Message::DeckReplaced(deck) => {
                self.replace(*deck);
                None
            }
            Message::Quit => Some(Command::Quit),
        }
    }

    fn animate(&self) -> Option<Command> {
        self.deck.is_animating().then_some(Command::Animate { fps: FPS })
    }

    fn replace(&mut self, mut deck: Deck) {
        let position = self.deck.position_index();
        deck.resize(self.width, self.height);
        deck.seek(position);
        deck.reset_transitions();
        self.deck = deck;
        self.generation += 1;
        log::info!(
            "Deck replaced: {} slides, showing slide {}",
            self.deck.len(),
            self.deck.position_index() + 1
        );
    }

    /// The screen contents, one string per row.
    pub fn view(&mut self) -> Vec<String> {
        if self.width == 0 || self.height == 0 {
            return Vec::new();
        }
        place(&self.deck.frame(), self.width, self.height)
    }
}

/// Translate a key press into a message. Releases and repeats are ignored.
pub fn key_message(key: &KeyEvent) -> Option<Message> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Some(Message::Quit),
        KeyCode::Char('q') | KeyCode::Esc => Some(Message::Quit),
        KeyCode::Right | KeyCode::Char('l') | KeyCode::Char(' ') => Some(Message::Advance),
        KeyCode::Left | KeyCode::Char('h') => Some(Message::Retreat),
        _ => None,
    }
}

fn spawn_input(tx: Sender<Message>) {
    std::thread::spawn(move || {
        loop {
            let message = match event::read() {
                Ok(Event::Key(key)) => key_message(&key),
                Ok(Event::Resize(width, height)) => Some(Message::Resize { width, height }),
                Ok(_) => None,
                Err(e) => {
                    log::error!("Failed to read terminal input: {e}");
                    Some(Message::Quit)
                }
            };
            let Some(message) = message else {
                continue;
            };
            let quit = matches!(message, Message::Quit);
            if tx.send(message).is_err() || quit {
                break;
            }
        }
    });
}

/// Present `file` until the user quits.
pub fn run(file: &Path, options: &Options) -> Result<()> {
    let config_path = Config::locate(options.config.as_deref())?;
    let deck = load_deck(file, &config_path)
        .with_context(|| format!("Failed to load {}", file.display()))?;
    log::info!(
        "Presenting {} ({} slides, config {})",
        file.display(),
        deck.len(),
        config_path.display()
    );

    let (tx, rx) = crossbeam_channel::unbounded();
    let _hot_reload = options
        .watch
        .then(|| HotReload::spawn(WatchTargets::new(file, &config_path), tx.clone()));

    terminal::install_panic_hook();
    let mut screen = Screen::enter()?;
    spawn_input(tx.clone());
    let (width, height) = crossterm::terminal::size().context("Failed to read terminal size")?;
    tx.send(Message::Resize { width, height })?;

    event_loop(Controller::new(deck), &rx, &mut screen)
}

fn event_loop(mut controller: Controller, rx: &Receiver<Message>, screen: &mut Screen) -> Result<()> {
    let mut frame_timer = never();
    let mut timer_generation = controller.generation();

    loop {
        let message = select! {
            recv(rx) -> message => match message {
                Ok(message) => message,
                Err(_) => break,
            },
            recv(frame_timer) -> _ => Message::FrameTick { generation: timer_generation },
        };
        if matches!(message, Message::FrameTick { .. }) {
            frame_timer = never();
        }

        match controller.update(message) {
            Some(Command::Quit) => break,
            Some(Command::Animate { fps }) => {
                timer_generation = controller.generation();
                frame_timer = after(Duration::from_secs(1) / fps.max(1));
            }
            None => {}
        }
        screen.draw(&controller.view())?;
    }
    Ok(())
}
