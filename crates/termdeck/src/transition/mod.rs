//! Animated blends between two rendered slide frames.
//!
//! Every animated variant drives a spring from zero toward the viewport
//! width or height and composes the outgoing and incoming frames according
//! to the spring's position. The lifecycle is `idle -> animating -> idle`:
//! [`Transition::update`] keeps asking for frames until the spring reaches
//! its target.

pub mod spring;

use crate::messages::Command;
use crate::render::ansi;
use spring::{FPS, FREQUENCY, Spring};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Direction {
    #[default]
    Forward,
    Backward,
}

/// The configured name of a transition, before it is started.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TransitionKind {
    #[default]
    None,
    SlideUp,
    SlideDown,
    SwipeLeft,
    SwipeRight,
    Flip,
}

impl TransitionKind {
    pub const ALL: [TransitionKind; 6] = [
        Self::None,
        Self::SlideUp,
        Self::SlideDown,
        Self::SwipeLeft,
        Self::SwipeRight,
        Self::Flip,
    ];

    /// Unknown names mean no transition.
    pub fn from_name(name: &str) -> Self {
        match name {
            "slideUp" => Self::SlideUp,
            "slideDown" => Self::SlideDown,
            "swipeLeft" => Self::SwipeLeft,
            "swipeRight" => Self::SwipeRight,
            "flip" => Self::Flip,
            _ => Self::None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::SlideUp => "slideUp",
            Self::SlideDown => "slideDown",
            Self::SwipeLeft => "swipeLeft",
            Self::SwipeRight => "swipeRight",
            Self::Flip => "flip",
        }
    }

    /// The variant that plays the same boundary in reverse.
    pub fn opposite(self) -> Self {
        match self {
            Self::SlideUp => Self::SlideDown,
            Self::SlideDown => Self::SlideUp,
            Self::SwipeLeft => Self::SwipeRight,
            Self::SwipeRight => Self::SwipeLeft,
            Self::None | Self::Flip => self,
        }
    }

    fn damping(self) -> f64 {
        match self {
            Self::SwipeLeft | Self::SwipeRight => 0.75,
            _ => 0.8,
        }
    }

    /// Begin a fresh animation for a `width` x `height` viewport.
    pub fn start(self, width: usize, height: usize, direction: Direction) -> Transition {
        let motion = |extent: usize, target: f64| Motion {
            spring: Spring::new(spring::fps(FPS), FREQUENCY, self.damping()),
            position: 0.0,
            velocity: 0.0,
            extent,
            target,
            animating: true,
            direction,
        };
        match self {
            Self::None => Transition::None,
            Self::SlideUp => Transition::SlideUp(motion(height, height as f64)),
            Self::SlideDown => Transition::SlideDown(motion(height, height as f64)),
            Self::SwipeLeft => Transition::SwipeLeft(motion(width, width as f64)),
            Self::SwipeRight => Transition::SwipeRight(motion(width, -(width as f64))),
            Self::Flip => Transition::Flip(motion(width, width as f64)),
        }
    }
}

/// Spring state shared by the animated variants.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Motion {
    spring: Spring,
    position: f64,
    velocity: f64,
    /// Viewport width or height the motion spans.
    extent: usize,
    target: f64,
    animating: bool,
    direction: Direction,
}

impl Motion {
    fn step(&mut self) -> Option<Command> {
        (self.position, self.velocity) =
            self.spring.update(self.position, self.velocity, self.target);

        let arrived = if self.target < 0.0 {
            self.position <= self.target
        } else {
            self.position >= self.target
        };
        if arrived {
            self.animating = false;
            return None;
        }
        Some(Command::Animate { fps: FPS })
    }

    /// Spring position rounded to whole cells, never negative.
    fn offset(&self) -> usize {
        self.position.round().max(0.0) as usize
    }
}

/// A running (or finished) transition into a slide.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum Transition {
    #[default]
    None,
    SlideUp(Motion),
    SlideDown(Motion),
    SwipeLeft(Motion),
    SwipeRight(Motion),
    Flip(Motion),
}

impl Transition {
    fn motion(&self) -> Option<&Motion> {
        match self {
            Self::None => None,
            Self::SlideUp(m)
            | Self::SlideDown(m)
            | Self::SwipeLeft(m)
            | Self::SwipeRight(m)
            | Self::Flip(m) => Some(m),
        }
    }

    pub fn kind(&self) -> TransitionKind {
        match self {
            Self::None => TransitionKind::None,
            Self::SlideUp(_) => TransitionKind::SlideUp,
            Self::SlideDown(_) => TransitionKind::SlideDown,
            Self::SwipeLeft(_) => TransitionKind::SwipeLeft,
            Self::SwipeRight(_) => TransitionKind::SwipeRight,
            Self::Flip(_) => TransitionKind::Flip,
        }
    }

    pub fn name(&self) -> &'static str {
        self.kind().name()
    }

    pub fn opposite(&self) -> TransitionKind {
        self.kind().opposite()
    }

    pub fn direction(&self) -> Direction {
        self.motion().map(|m| m.direction).unwrap_or_default()
    }

    pub fn animating(&self) -> bool {
        self.motion().is_some_and(|m| m.animating)
    }

    /// `Some` while there is motion left to play. A `none` transition is
    /// finished the moment it starts.
    pub fn into_running(self) -> Option<Self> {
        self.animating().then_some(self)
    }

    /// Advance one frame. Returns the command for the next frame, or `None`
    /// once the motion has settled.
    pub fn update(&mut self) -> Option<Command> {
        match self {
            Self::None => None,
            Self::SlideUp(m)
            | Self::SlideDown(m)
            | Self::SwipeLeft(m)
            | Self::SwipeRight(m)
            | Self::Flip(m) => {
                if !m.animating {
                    return None;
                }
                m.step()
            }
        }
    }

    /// Compose the frame shown this tick. `prev` is the frame being left
    /// and `next` the frame being entered. `None` means "show `next`".
    ///
    /// # Panics
    /// The horizontal variants panic when `prev` and `next` have different
    /// line counts.
    pub fn view(&self, prev: &str, next: &str) -> Option<String> {
        match self {
            Self::None => None,
            Self::SlideUp(m) => Some(slide_up(prev, next, m.offset())),
            Self::SlideDown(m) => Some(slide_down(prev, next, m.offset())),
            Self::SwipeLeft(m) => Some(swipe_left(prev, next, m.offset())),
            Self::SwipeRight(m) => {
                let remaining = (m.extent as f64 + m.position).round().max(0.0) as usize;
                Some(swipe_right(prev, next, remaining))
            }
            Self::Flip(m) => Some(flip(prev, next, m.offset())),
        }
    }
}

/// `prev` in full, then the first `rows` lines of `next`.
fn slide_up(prev: &str, next: &str, rows: usize) -> String {
    let next_lines: Vec<&str> = next.split('\n').collect();
    let rows = rows.min(next_lines.len());
    prev.split('\n')
        .chain(next_lines[..rows].iter().copied())
        .collect::<Vec<_>>()
        .join("\n")
}

/// The last `rows` lines of `next` above what is left of `prev`.
fn slide_down(prev: &str, next: &str, rows: usize) -> String {
    let next_lines: Vec<&str> = next.split('\n').collect();
    let prev_lines: Vec<&str> = prev.split('\n').collect();
    let shown = rows.min(next_lines.len());
    let kept = prev_lines.len() - rows.min(prev_lines.len());
    next_lines[next_lines.len() - shown..]
        .iter()
        .chain(&prev_lines[..kept])
        .copied()
        .collect::<Vec<_>>()
        .join("\n")
}

fn paired_lines<'a>(prev: &'a str, next: &'a str) -> Vec<(&'a str, &'a str)> {
    let prev_lines: Vec<&str> = prev.split('\n').collect();
    let next_lines: Vec<&str> = next.split('\n').collect();
    assert_eq!(
        prev_lines.len(),
        next_lines.len(),
        "slides of unequal height"
    );
    prev_lines.into_iter().zip(next_lines).collect()
}

/// `prev` moves out to the left while `next` follows it in.
fn swipe_left(prev: &str, next: &str, columns: usize) -> String {
    paired_lines(prev, next)
        .into_iter()
        .map(|(p, n)| format!("{} {}", ansi::skip(p, columns), ansi::truncate(n, columns)))
        .collect::<Vec<_>>()
        .join("\n")
}

/// `prev` moves out to the right while `next` follows it in. `remaining`
/// is how many columns of `prev` are still visible.
fn swipe_right(prev: &str, next: &str, remaining: usize) -> String {
    paired_lines(prev, next)
        .into_iter()
        .map(|(p, n)| format!("{} {}", ansi::skip(n, remaining), ansi::truncate(p, remaining)))
        .collect::<Vec<_>>()
        .join("\n")
}

/// `next` grows from the left while `prev` folds into its right edge.
fn flip(prev: &str, next: &str, columns: usize) -> String {
    paired_lines(prev, next)
        .into_iter()
        .map(|(p, n)| {
            let wrapped = ansi::word_wrap(p, columns);
            let tail = wrapped.last().map(String::as_str).unwrap_or_default();
            format!("{} {tail}", ansi::truncate(n, columns))
        })
        .collect::<Vec<_>>()
        .join("\n")
}
