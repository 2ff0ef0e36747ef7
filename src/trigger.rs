use crate::types::ListStatus;

/// "Is the row at `index` on screen?" The list view implements this from its
/// scroll offset; tests can implement it however they like.
pub trait Proximity {
    fn is_visible(&self, index: usize) -> bool;
}

/// Visible window of a scrolled list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ListViewport {
    pub offset: usize,
    pub height: usize,
}

impl Proximity for ListViewport {
    fn is_visible(&self, index: usize) -> bool {
        index >= self.offset && index < self.offset + self.height
    }
}

/// Advances pagination when the tail of the list scrolls into view.
///
/// Attached to one tail item at a time. A new tail id re-arms it; a firing
/// needs a hidden→visible transition of the current tail, so a tail that
/// stays on screen asks for more only once.
#[derive(Debug, Default)]
pub struct LoadMoreTrigger {
    attached: Option<String>,
    was_visible: bool,
    prefetch_distance: usize,
}

impl LoadMoreTrigger {
    pub fn new(prefetch_distance: usize) -> Self {
        Self {
            attached: None,
            was_visible: false,
            prefetch_distance,
        }
    }

    /// Feed the latest visibility of the tail. Returns true when the caller
    /// should request the next page.
    pub fn observe(&mut self, tail_id: Option<&str>, visible: bool, status: ListStatus) -> bool {
        if self.attached.as_deref() != tail_id {
            self.attached = tail_id.map(str::to_string);
            self.was_visible = false;
        }
        if self.attached.is_none() {
            return false;
        }
        // Stay disarmed while a page is loading so one gesture can't advance twice.
        if status == ListStatus::Loading {
            return false;
        }

        let fire = visible && !self.was_visible;
        self.was_visible = visible;
        fire
    }

    /// Convenience over `observe` for a list of ids and a `Proximity` probe.
    /// With a prefetch distance, any of the last N rows counts as the tail.
    pub fn poll<'a, I, P>(&mut self, ids: I, len: usize, probe: &P, status: ListStatus) -> bool
    where
        I: IntoIterator<Item = &'a str>,
        P: Proximity + ?Sized,
    {
        let Some(last) = len.checked_sub(1) else {
            return self.observe(None, false, status);
        };
        let tail_id = ids.into_iter().nth(last);
        let first_tail_row = last.saturating_sub(self.prefetch_distance);
        let visible = (first_tail_row..=last).any(|i| probe.is_visible(i));
        self.observe(tail_id, visible, status)
    }

    pub fn detach(&mut self) {
        self.attached = None;
        self.was_visible = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn viewport_visibility_window() {
        let vp = ListViewport {
            offset: 10,
            height: 5,
        };
        assert!(!vp.is_visible(9));
        assert!(vp.is_visible(10));
        assert!(vp.is_visible(14));
        assert!(!vp.is_visible(15));
    }

    #[test]
    fn fires_once_per_visibility_transition() {
        let mut trigger = LoadMoreTrigger::new(0);
        assert!(!trigger.observe(Some("s-19"), false, ListStatus::Ready));
        assert!(trigger.observe(Some("s-19"), true, ListStatus::Ready));
        assert!(!trigger.observe(Some("s-19"), true, ListStatus::Ready));

        // scrolled away and back
        assert!(!trigger.observe(Some("s-19"), false, ListStatus::Ready));
        assert!(trigger.observe(Some("s-19"), true, ListStatus::Ready));
    }

    #[test]
    fn inert_while_loading() {
        let mut trigger = LoadMoreTrigger::new(0);
        assert!(!trigger.observe(Some("s-19"), true, ListStatus::Loading));
        // the transition is still pending once loading ends
        assert!(trigger.observe(Some("s-19"), true, ListStatus::Ready));
    }

    #[test]
    fn new_tail_rearms() {
        let mut trigger = LoadMoreTrigger::new(0);
        assert!(trigger.observe(Some("s-19"), true, ListStatus::Ready));
        // page 2 appended while the old tail was on screen, new tail visible too
        assert!(trigger.observe(Some("s-39"), true, ListStatus::Ready));
    }

    #[test]
    fn empty_list_never_fires() {
        let mut trigger = LoadMoreTrigger::new(0);
        let probe = ListViewport {
            offset: 0,
            height: 10,
        };
        assert!(!trigger.poll(std::iter::empty(), 0, &probe, ListStatus::Ready));
    }

    #[test]
    fn poll_uses_last_row() {
        let ids: Vec<String> = (0..20).map(|n| format!("s-{}", n)).collect();
        let mut trigger = LoadMoreTrigger::new(0);

        let top = ListViewport {
            offset: 0,
            height: 10,
        };
        assert!(!trigger.poll(ids.iter().map(String::as_str), ids.len(), &top, ListStatus::Ready));

        let bottom = ListViewport {
            offset: 12,
            height: 10,
        };
        assert!(trigger.poll(ids.iter().map(String::as_str), ids.len(), &bottom, ListStatus::Ready));
    }

    #[test]
    fn prefetch_distance_fires_early() {
        let ids: Vec<String> = (0..20).map(|n| format!("s-{}", n)).collect();
        let mut trigger = LoadMoreTrigger::new(5);
        let near_end = ListViewport {
            offset: 5,
            height: 10,
        };
        assert!(trigger.poll(ids.iter().map(String::as_str), ids.len(), &near_end, ListStatus::Ready));
    }

    struct Always;

    impl Proximity for Always {
        fn is_visible(&self, _index: usize) -> bool {
            true
        }
    }

    #[test]
    fn detach_then_same_tail_fires_again() {
        let mut trigger = LoadMoreTrigger::new(0);
        let ids = ["a", "b"];
        assert!(trigger.poll(ids, 2, &Always, ListStatus::Ready));
        trigger.detach();
        assert!(trigger.poll(ids, 2, &Always, ListStatus::Ready));
    }
}
