//! Structural changes to one profile's button list

use crate::config::profile::Button;
use crate::error::MutationError;

#[derive(Debug, Clone, PartialEq)]
pub enum ButtonMutation {
    Push(Button),
    Remove(usize),
    Replace { index: usize, button: Button },
    /// Remove at `from`, then insert at `to` (intermediate buttons shift)
    Move { from: usize, to: usize },
}

fn check(index: usize, len: usize) -> Result<(), MutationError> {
    if index < len {
        Ok(())
    } else {
        Err(MutationError::OutOfRange { index, len })
    }
}

impl ButtonMutation {
    /// Apply to `buttons`; on error the list is left untouched
    pub fn apply(self, buttons: &mut Vec<Button>) -> Result<(), MutationError> {
        let len = buttons.len();
        match self {
            ButtonMutation::Push(button) => buttons.push(button),
            ButtonMutation::Remove(index) => {
                check(index, len)?;
                buttons.remove(index);
            }
            ButtonMutation::Replace { index, button } => {
                check(index, len)?;
                buttons[index] = button;
            }
            ButtonMutation::Move { from, to } => {
                check(from, len)?;
                check(to, len)?;
                if from != to {
                    let button = buttons.remove(from);
                    buttons.insert(to, button);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::profile::Action;

    fn buttons(labels: &[&str]) -> Vec<Button> {
        labels
            .iter()
            .map(|label| Button::new(*label, Action::default()))
            .collect()
    }

    fn labels(buttons: &[Button]) -> Vec<&str> {
        buttons.iter().map(|b| b.label.as_str()).collect()
    }

    #[test]
    fn test_move_is_insertion() {
        let mut list = buttons(&["b0", "b1", "b2"]);
        ButtonMutation::Move { from: 0, to: 2 }.apply(&mut list).unwrap();
        assert_eq!(labels(&list), vec!["b1", "b2", "b0"]);

        ButtonMutation::Move { from: 2, to: 0 }.apply(&mut list).unwrap();
        assert_eq!(labels(&list), vec!["b0", "b1", "b2"]);
    }

    #[test]
    fn test_every_move_preserves_multiset() {
        let original = buttons(&["a", "b", "c", "d", "e"]);
        for from in 0..original.len() {
            for to in 0..original.len() {
                let mut list = original.clone();
                ButtonMutation::Move { from, to }.apply(&mut list).unwrap();

                let mut before = labels(&original);
                let mut after = labels(&list);
                before.sort();
                after.sort();
                assert_eq!(before, after, "move {from} -> {to}");
                assert_eq!(list[to].label, original[from].label);
            }
        }
    }

    #[test]
    fn test_out_of_range_leaves_list_untouched() {
        let mut list = buttons(&["b0", "b1"]);
        assert_eq!(
            ButtonMutation::Move { from: 0, to: 2 }.apply(&mut list),
            Err(MutationError::OutOfRange { index: 2, len: 2 })
        );
        assert_eq!(
            ButtonMutation::Remove(5).apply(&mut list),
            Err(MutationError::OutOfRange { index: 5, len: 2 })
        );
        assert_eq!(labels(&list), vec!["b0", "b1"]);

        ButtonMutation::Push(Button::placeholder())
            .apply(&mut list)
            .unwrap();
        assert_eq!(labels(&list), vec!["b0", "b1", "New"]);
    }
}
