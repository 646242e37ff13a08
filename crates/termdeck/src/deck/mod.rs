//! The slide sequence and the cursor over it.
//!
//! Slides live in one vector and link to their neighbours by index. A deck
//! is never empty and is only ever replaced as a whole.

use std::fmt::Display;

use crossterm::style::{Color, Stylize};

use crate::config::Config;
use crate::error::DeckError;
use crate::messages::Command;
use crate::parser::RawProperties;
use crate::render::render_markdown;
use crate::style::{SlideStyle, StyleConfig};
use crate::transition::{Direction, Transition, TransitionKind};

/// Resolved per-slide configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Properties {
    pub style: StyleConfig,
    /// Transition played when entering this slide.
    pub transition: TransitionKind,
}

impl Properties {
    pub fn resolve(raw: &RawProperties, config: &Config) -> Result<Self, DeckError> {
        Ok(Self {
            style: config.resolve(&raw.style)?,
            transition: TransitionKind::from_name(raw.transition.as_deref().unwrap_or_default()),
        })
    }

    /// Front matter that resolves back to these properties.
    pub fn to_raw(&self) -> RawProperties {
        RawProperties {
            style: self.style.to_layer(),
            transition: Some(self.transition.name().to_string()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Slide {
    pub body: String,
    pub properties: Properties,
    pub prev: Option<usize>,
    pub next: Option<usize>,
    /// The animation entering this slide, while it runs.
    pub active_transition: Option<Transition>,
    style: SlideStyle,
    render_cache: Option<String>,
}

impl Slide {
    fn new(body: String, properties: Properties) -> Self {
        Self {
            body,
            properties,
            prev: None,
            next: None,
            active_transition: None,
            style: SlideStyle::default(),
            render_cache: None,
        }
    }

    pub fn style(&self) -> &SlideStyle {
        &self.style
    }

    fn apply_style(&mut self, width: usize, height: usize) {
        self.style = self.properties.style.apply(width, height);
        self.render_cache = None;
    }

    /// The slide's static frame: its body rendered inside the style box.
    pub fn render(&mut self) -> &str {
        let frame = match self.render_cache.take() {
            Some(frame) => frame,
            None => self.draw(),
        };
        self.render_cache.insert(frame)
    }

    fn draw(&self) -> String {
        let theme = &self.properties.style.theme;
        match render_markdown(&self.body, theme, self.style.content_width()) {
            Ok(text) => self.style.render(&text),
            Err(e) => {
                log::warn!("Failed to render slide: {e}");
                let message = format!("Error: {e}").with(Color::AnsiValue(9));
                self.style.render(&format!("\n\n{message}"))
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct Deck {
    slides: Vec<Slide>,
    current: usize,
    width: usize,
    height: usize,
}

impl Deck {
    /// Resolve every slide's properties and link the slides in order.
    pub fn build(slides: Vec<(String, RawProperties)>, config: &Config) -> Result<Self, DeckError> {
        let slides = slides
            .into_iter()
            .map(|(body, raw)| Ok(Slide::new(body, Properties::resolve(&raw, config)?)))
            .collect::<Result<Vec<_>, DeckError>>()?;
        Ok(Self::from_slides(slides))
    }

    /// A one-slide deck describing `err`.
    pub fn error(err: &dyn Display) -> Self {
        let body = format!(
            "# Error while updating\n\n{err}\n\n\
             If you believe this is our fault, please open up an issue on GitHub"
        );
        Self::from_slides(vec![Slide::new(body, Properties::default())])
    }

    fn from_slides(mut slides: Vec<Slide>) -> Self {
        if slides.is_empty() {
            slides.push(Slide::new(String::new(), Properties::default()));
        }
        let last = slides.len() - 1;
        for (i, slide) in slides.iter_mut().enumerate() {
            slide.prev = i.checked_sub(1);
            slide.next = (i < last).then_some(i + 1);
        }
        Self {
            slides,
            current: 0,
            width: 0,
            height: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.slides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }

    pub fn slides(&self) -> &[Slide] {
        &self.slides
    }

    pub fn current(&self) -> &Slide {
        &self.slides[self.current]
    }

    pub fn current_mut(&mut self) -> &mut Slide {
        &mut self.slides[self.current]
    }

    /// Distance of the current slide from the first one.
    pub fn position_index(&self) -> usize {
        self.current
    }

    pub fn is_animating(&self) -> bool {
        self.current()
            .active_transition
            .is_some_and(|t| t.animating())
    }

    /// Move to the next slide and start its transition. Refused at the last
    /// slide or while a transition is running.
    pub fn advance(&mut self) -> bool {
        if self.is_animating() {
            return false;
        }
        let Some(next) = self.current().next else {
            return false;
        };
        self.current = next;
        let (width, height) = (self.width, self.height);
        let slide = &mut self.slides[next];
        let kind = slide.properties.transition;
        slide.active_transition = kind.start(width, height, Direction::Forward).into_running();
        log::debug!("Advanced to slide {next} with {}", kind.name());
        true
    }

    /// Move to the previous slide, playing the reverse of the transition
    /// that entered the slide being left.
    pub fn retreat(&mut self) -> bool {
        if self.is_animating() {
            return false;
        }
        let Some(prev) = self.current().prev else {
            return false;
        };
        let kind = self.current().properties.transition.opposite();
        self.current = prev;
        self.slides[prev].active_transition = kind
            .start(self.width, self.height, Direction::Backward)
            .into_running();
        log::debug!("Retreated to slide {prev} with {}", kind.name());
        true
    }

    /// Step the current slide's transition by one frame.
    pub fn tick(&mut self) -> Option<Command> {
        let slide = &mut self.slides[self.current];
        let transition = slide.active_transition.as_mut()?;
        let command = transition.update();
        if command.is_none() {
            log::trace!("Transition {} finished", transition.name());
            slide.active_transition = None;
        }
        command
    }

    /// Re-size every slide's box. Running transitions are left alone.
    pub fn resize(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
        for slide in &mut self.slides {
            slide.apply_style(width, height);
        }
    }

    /// Walk forward from the first slide by `position` steps, stopping at
    /// the last slide.
    pub fn seek(&mut self, position: usize) {
        self.current = 0;
        for _ in 0..position {
            match self.current().next {
                Some(next) => self.current = next,
                None => break,
            }
        }
    }

    pub fn reset_transitions(&mut self) {
        for slide in &mut self.slides {
            slide.active_transition = None;
        }
    }

    /// The frame to show now: the current slide, blended with the slide
    /// being left while a transition runs.
    pub fn frame(&mut self) -> String {
        let index = self.current;
        let next = self.slides[index].render().to_string();

        let Some(transition) = self.slides[index]
            .active_transition
            .filter(Transition::animating)
        else {
            return next;
        };
        let leaving = match transition.direction() {
            Direction::Forward => self.slides[index].prev,
            Direction::Backward => self.slides[index].next,
        };
        let Some(leaving) = leaving else {
            return next;
        };
        let prev = self.slides[leaving].render().to_string();
        transition.view(&prev, &next).unwrap_or(next)
    }
}
