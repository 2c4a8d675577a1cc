//! Cross-thread parameter edits.
//!
//! A UI or control thread pushes [`SeqCommand`]s into a lock-free SPSC
//! ring; the sequencer drains the ring at the top of every `advance` call,
//! so edits always land between blocks and never tear mid-step. Every
//! command is `Copy`, so draining never frees memory on the audio thread.

use ringbuf::traits::{Producer, Split};
use ringbuf::{HeapProd, HeapRb};

use crate::composition::{DrillFillPolicy, DrillGatePolicy, IdmMacroPreset};
use crate::drill::DrillMode;
use crate::groove::{DillaParams, RoleTiming};
use crate::pattern::RhythmFeelMode;

/// A parameter edit destined for the audio thread.
#[derive(Debug, Clone, Copy)]
pub enum SeqCommand {
    SetTempo(f64),
    SetSwing(f32),
    SetPatternLength(u32),
    SetRoleTiming(RoleTiming),
    SetDillaParams(DillaParams),
    SetRhythmFeel(RhythmFeelMode),
    SetDrillMode(DrillMode),
    SetFillPolicy(DrillFillPolicy),
    SetGatePolicy(DrillGatePolicy),
    SetBarsPerPhrase(u32),
    ApplyMacro(IdmMacroPreset),
}

/// Producer half of the command ring, held by the control thread.
pub struct CommandSender {
    inner: HeapProd<SeqCommand>,
}

impl CommandSender {
    /// Queue a command. Returns false when the ring is full (the edit is
    /// dropped; send it again next frame).
    pub fn send(&mut self, cmd: SeqCommand) -> bool {
        self.inner.try_push(cmd).is_ok()
    }
}

/// Build a command ring of the given capacity.
pub(crate) fn command_queue(
    capacity: usize,
) -> (CommandSender, ringbuf::HeapCons<SeqCommand>) {
    let rb = HeapRb::new(capacity.max(1));
    let (prod, cons) = rb.split();
    (CommandSender { inner: prod }, cons)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ringbuf::traits::Consumer;

    #[test]
    fn test_commands_arrive_in_order() {
        let (mut tx, mut rx) = command_queue(8);
        assert!(tx.send(SeqCommand::SetTempo(140.0)));
        assert!(tx.send(SeqCommand::SetSwing(0.5)));
        assert!(matches!(rx.try_pop(), Some(SeqCommand::SetTempo(t)) if t == 140.0));
        assert!(matches!(rx.try_pop(), Some(SeqCommand::SetSwing(s)) if s == 0.5));
        assert!(rx.try_pop().is_none());
    }

    #[test]
    fn test_full_ring_rejects() {
        let (mut tx, _rx) = command_queue(2);
        assert!(tx.send(SeqCommand::SetTempo(100.0)));
        assert!(tx.send(SeqCommand::SetTempo(101.0)));
        assert!(!tx.send(SeqCommand::SetTempo(102.0)), "third push must be rejected");
    }
}
