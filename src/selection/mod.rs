use std::fmt;

use ahash::AHashSet;
use sha2::{Digest, Sha256};

use crate::region::{normalize_code, Granularity};

/// Callback receiving the full sorted selection after every change.
pub type ChangeListener = Box<dyn Fn(&[String]) + Send + Sync>;

/// The canonical set of selected region codes for one layer at one granularity.
///
/// Every mutation is idempotent: adding a present code or removing an absent one is a no-op.
/// Codes are normalized for the set's granularity on the way in. The listener fires only
/// when a call actually changed the set.
pub struct SelectionSet {
    granularity: Granularity,
    codes: AHashSet<String>,
    revision: u64,
    listener: Option<ChangeListener>,
}

impl SelectionSet {
    pub fn new(granularity: Granularity) -> Self {
        Self { granularity, codes: AHashSet::new(), revision: 0, listener: None }
    }

    /// A set pre-populated with `codes`; does not count as a change.
    pub fn with_codes<S: AsRef<str>>(granularity: Granularity, codes: &[S]) -> Self {
        let mut set = Self::new(granularity);
        set.codes.extend(codes.iter().filter_map(|c| normalize_code(c.as_ref(), granularity)));
        set
    }

    #[inline] pub fn granularity(&self) -> Granularity { self.granularity }

    #[inline] pub fn len(&self) -> usize { self.codes.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.codes.is_empty() }

    /// Incremented on every effective change.
    #[inline] pub fn revision(&self) -> u64 { self.revision }

    /// Register the callback that receives the snapshot after each change.
    pub fn set_listener(&mut self, listener: impl Fn(&[String]) + Send + Sync + 'static) {
        self.listener = Some(Box::new(listener));
    }

    pub fn clear_listener(&mut self) { self.listener = None }

    /// Detach the listener so it can be moved onto a successor set.
    pub(crate) fn take_listener(&mut self) -> Option<ChangeListener> { self.listener.take() }

    pub fn contains(&self, code: &str) -> bool {
        normalize_code(code, self.granularity).is_some_and(|code| self.codes.contains(&code))
    }

    /// Add codes; returns how many were newly added.
    pub fn add<S: AsRef<str>>(&mut self, codes: &[S]) -> usize {
        let mut added = 0;
        for code in codes.iter().filter_map(|c| normalize_code(c.as_ref(), self.granularity)) {
            if self.codes.insert(code) { added += 1 }
        }
        if added > 0 { self.changed() }
        added
    }

    /// Remove codes; returns how many were actually present.
    pub fn remove<S: AsRef<str>>(&mut self, codes: &[S]) -> usize {
        let mut removed = 0;
        for code in codes.iter().filter_map(|c| normalize_code(c.as_ref(), self.granularity)) {
            if self.codes.remove(&code) { removed += 1 }
        }
        if removed > 0 { self.changed() }
        removed
    }

    /// Flip a single code. Returns `true` if it is selected afterwards.
    pub fn toggle(&mut self, code: &str) -> bool {
        let Some(code) = normalize_code(code, self.granularity) else { return false };
        let selected = if self.codes.remove(&code) { false } else { self.codes.insert(code); true };
        self.changed();
        selected
    }

    /// Flip each code individually, emitting a single change. Duplicate codes in the input
    /// flip once.
    pub fn toggle_each<S: AsRef<str>>(&mut self, codes: &[S]) -> usize {
        let mut unique = codes.iter()
            .filter_map(|c| normalize_code(c.as_ref(), self.granularity))
            .collect::<Vec<_>>();
        unique.sort_unstable();
        unique.dedup();

        for code in &unique {
            if !self.codes.remove(code) { self.codes.insert(code.clone()); }
        }
        if !unique.is_empty() { self.changed() }
        unique.len()
    }

    /// Make the selection exactly `codes`.
    pub fn replace<S: AsRef<str>>(&mut self, codes: &[S]) {
        let next = codes.iter()
            .filter_map(|c| normalize_code(c.as_ref(), self.granularity))
            .collect::<AHashSet<_>>();
        if next != self.codes {
            self.codes = next;
            self.changed();
        }
    }

    pub fn clear(&mut self) {
        if !self.codes.is_empty() {
            self.codes.clear();
            self.changed();
        }
    }

    /// Sorted copy of the selected codes.
    pub fn snapshot(&self) -> Vec<String> {
        let mut codes = self.codes.iter().cloned().collect::<Vec<_>>();
        codes.sort_unstable();
        codes
    }

    /// Iterate the selected codes in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        self.codes.iter().map(String::as_str)
    }

    /// SHA-256 hex digest over the sorted codes. Equal sets have equal fingerprints.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.granularity.to_str().as_bytes());
        for code in self.snapshot() {
            hasher.update(b"\n");
            hasher.update(code.as_bytes());
        }
        hex::encode(hasher.finalize())
    }

    fn changed(&mut self) {
        self.revision += 1;
        if let Some(listener) = &self.listener {
            listener(&self.snapshot());
        }
    }
}

impl fmt::Debug for SelectionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectionSet")
            .field("granularity", &self.granularity)
            .field("codes", &self.snapshot())
            .field("revision", &self.revision)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    fn set(codes: &[&str]) -> SelectionSet {
        SelectionSet::with_codes(Granularity::FiveDigit, codes)
    }

    #[test]
    fn add_is_idempotent() {
        let mut once = set(&[]);
        once.add(&["80331"]);
        let mut twice = set(&[]);
        twice.add(&["80331"]);
        assert_eq!(twice.add(&["80331"]), 0);
        assert_eq!(once.snapshot(), twice.snapshot());
    }

    #[test]
    fn remove_absent_is_a_noop() {
        let mut s = set(&["80331"]);
        assert_eq!(s.remove(&["10115"]), 0);
        assert_eq!(s.revision(), 0);
        assert_eq!(s.remove(&["80331"]), 1);
        assert!(s.is_empty());
    }

    #[test]
    fn toggle_twice_restores() {
        let mut s = set(&["80331", "10115"]);
        let before = s.snapshot();
        assert!(s.toggle("01067"));
        assert!(!s.toggle("01067"));
        assert_eq!(s.snapshot(), before);
        assert!(!s.toggle("80331"));
        assert!(!s.contains("80331"));
    }

    #[test]
    fn codes_are_normalized() {
        let mut s = set(&["1067"]);
        assert!(s.contains("01067"));
        assert!(s.contains("1067"));
        assert_eq!(s.add(&["01067"]), 0);
    }

    #[test]
    fn toggle_each_inverts_mixed_input() {
        let mut s = set(&["1", "2"]);
        s.toggle_each(&["2", "3", "3"]);
        assert_eq!(s.snapshot(), vec!["00001", "00003"]);
    }

    #[test]
    fn replace_and_clear() {
        let mut s = set(&["80331"]);
        s.replace(&["10115", "01067"]);
        assert_eq!(s.snapshot(), vec!["01067", "10115"]);
        let revision = s.revision();
        s.replace(&["01067", "10115"]);
        assert_eq!(s.revision(), revision);
        s.clear();
        assert!(s.is_empty());
    }

    #[test]
    fn listener_sees_every_effective_change() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let mut s = set(&[]);
        s.set_listener(move |codes| sink.lock().unwrap().push(codes.to_vec()));

        s.add(&["80331"]);
        s.add(&["80331"]);     // no-op
        s.remove(&["99999"]);  // no-op
        s.toggle("10115");
        s.clear();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 3);
        assert_eq!(seen[1], vec!["10115", "80331"]);
        assert!(seen[2].is_empty());
    }

    #[test]
    fn fingerprint_depends_only_on_content() {
        let a = set(&["80331", "10115"]);
        let b = set(&["10115", "80331"]);
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_ne!(a.fingerprint(), set(&["80331"]).fingerprint());
        assert_eq!(a.fingerprint().len(), 64);
    }
}
