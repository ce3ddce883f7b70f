/// The current position in the file set, plus the frame counter for
/// animated images. When the set is empty the index pins at 0 and every
/// navigation call is a no-op; otherwise `0 <= index < len` always holds.
#[derive(Debug, Default)]
pub struct NavigationState {
    index: usize,
    frame_index: usize,
}

impl NavigationState {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn frame_index(&self) -> usize {
        self.frame_index
    }

    pub fn next(&mut self, len: usize) {
        if len > 0 {
            self.set_index((self.index + 1) % len);
        }
    }

    pub fn previous(&mut self, len: usize) {
        if len > 0 {
            self.set_index((self.index + len - 1) % len);
        }
    }

    pub fn jump_to(&mut self, index: usize, len: usize) {
        if len > 0 {
            self.set_index(index % len);
        }
    }

    /// Called whenever the file set snapshot is swapped. An index that fell
    /// out of the new bounds resets to 0.
    pub fn on_file_set_replaced(&mut self, new_len: usize) {
        if new_len == 0 || self.index >= new_len {
            self.index = 0;
        }
        self.frame_index = 0;
    }

    pub fn advance_frame(&mut self, frame_count: usize) {
        if frame_count > 0 {
            self.frame_index = (self.frame_index + 1) % frame_count;
        }
    }

    fn set_index(&mut self, index: usize) {
        if index != self.index {
            self.index = index;
            self.frame_index = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_wraps_back_to_start_after_len_steps() {
        for start in 0..5 {
            let mut nav = NavigationState::default();
            nav.jump_to(start, 5);
            for _ in 0..5 {
                nav.next(5);
            }
            assert_eq!(nav.index(), start);
        }
    }

    #[test]
    fn previous_wraps_back_to_start_after_len_steps() {
        for start in 0..5 {
            let mut nav = NavigationState::default();
            nav.jump_to(start, 5);
            for _ in 0..5 {
                nav.previous(5);
            }
            assert_eq!(nav.index(), start);
        }
    }

    #[test]
    fn previous_from_zero_wraps_to_last() {
        // FileSet=[A,B,C], index=0, previous() -> index=2.
        let mut nav = NavigationState::default();
        nav.previous(3);
        assert_eq!(nav.index(), 2);
    }

    #[test]
    fn empty_set_pins_index_at_zero() {
        let mut nav = NavigationState::default();
        nav.next(0);
        nav.previous(0);
        nav.jump_to(7, 0);
        assert_eq!(nav.index(), 0);
    }

    #[test]
    fn replacement_resets_out_of_range_index() {
        let mut nav = NavigationState::default();
        nav.jump_to(4, 6);
        nav.on_file_set_replaced(5);
        assert_eq!(nav.index(), 4);
        nav.on_file_set_replaced(3);
        assert_eq!(nav.index(), 0);
        nav.on_file_set_replaced(0);
        assert_eq!(nav.index(), 0);
    }

    #[test]
    fn index_change_resets_frame_counter() {
        let mut nav = NavigationState::default();
        nav.advance_frame(8);
        nav.advance_frame(8);
        assert_eq!(nav.frame_index(), 2);
        nav.next(4);
        assert_eq!(nav.frame_index(), 0);

        nav.advance_frame(8);
        nav.jump_to(1, 4);
        // Jumping to the current index is not an index change.
        assert_eq!(nav.frame_index(), 1);
        nav.jump_to(3, 4);
        assert_eq!(nav.frame_index(), 0);
    }

    #[test]
    fn frame_counter_wraps_at_frame_count() {
        let mut nav = NavigationState::default();
        for _ in 0..5 {
            nav.advance_frame(3);
        }
        assert_eq!(nav.frame_index(), 2);
    }
}
