use crate::deck::Deck;

/// Everything the event loop reacts to, in arrival order.
#[derive(Debug)]
pub enum Message {
    Resize { width: u16, height: u16 },
    Advance,
    Retreat,
    /// One animation frame, scheduled for the deck with this generation.
    FrameTick { generation: u64 },
    /// A freshly parsed deck (or an error slide) from the file watcher.
    DeckReplaced(Box<Deck>),
    Quit,
}

/// Follow-up work requested by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Deliver a `FrameTick` after `1 / fps` seconds.
    Animate { fps: u32 },
    Quit,
}
