//! Suggestion list for the home network field, fed by the device's network
//! scan.

/// Keys the suggestion list reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavKey {
    Down,
    Up,
    Enter,
}

/// A visible suggestion split at the typed prefix so the matched part can be
/// emphasised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Suggestion<'a> {
    pub index: usize,
    pub matched: &'a str,
    pub rest: &'a str,
    pub active: bool,
}

impl Suggestion<'_> {
    pub fn value(&self) -> String {
        format!("{}{}", self.matched, self.rest)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Autocomplete {
    candidates: Vec<String>,
    /// Indices into `candidates` of the open list, in candidate order.
    matches: Vec<usize>,
    prefix_chars: usize,
    focus: Option<usize>,
    open: bool,
}

impl Autocomplete {
    pub fn new(candidates: Vec<String>) -> Self {
        Self {
            candidates,
            ..Default::default()
        }
    }

    /// Replace the candidates, closing any open list.
    pub fn set_candidates(&mut self, candidates: Vec<String>) {
        self.candidates = candidates;
        self.close();
    }

    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Position of the highlighted entry within the open list.
    pub fn focus(&self) -> Option<usize> {
        self.focus
    }

    /// Rebuild the list for `input`. Candidates starting with `input`,
    /// ignoring case, are kept; an empty input keeps them all. The highlight
    /// is cleared.
    pub fn update(&mut self, input: &str) {
        let wanted: Vec<char> = input.chars().flat_map(char::to_uppercase).collect();
        let prefix_chars = input.chars().count();
        self.matches = self
            .candidates
            .iter()
            .enumerate()
            .filter(|(_, c)| {
                let head: Vec<char> = c
                    .chars()
                    .take(prefix_chars)
                    .flat_map(char::to_uppercase)
                    .collect();
                head == wanted
            })
            .map(|(i, _)| i)
            .collect();
        self.prefix_chars = prefix_chars;
        self.focus = None;
        self.open = true;
    }

    pub fn close(&mut self) {
        self.matches.clear();
        self.focus = None;
        self.open = false;
    }

    pub fn suggestions(&self) -> Vec<Suggestion<'_>> {
        self.matches
            .iter()
            .enumerate()
            .map(|(pos, &idx)| {
                let value = &self.candidates[idx];
                let split = value
                    .char_indices()
                    .nth(self.prefix_chars)
                    .map_or(value.len(), |(i, _)| i);
                Suggestion {
                    index: pos,
                    matched: &value[..split],
                    rest: &value[split..],
                    active: self.focus == Some(pos),
                }
            })
            .collect()
    }

    /// Handle a navigation key. Arrows move the highlight, wrapping at both
    /// ends; Enter picks the highlighted entry and returns its value.
    pub fn key(&mut self, key: NavKey) -> Option<String> {
        if !self.open {
            return None;
        }
        let len = self.matches.len();
        match key {
            NavKey::Down if len > 0 => {
                self.focus = Some(match self.focus {
                    Some(f) if f + 1 < len => f + 1,
                    Some(_) => 0,
                    None => 0,
                });
                None
            }
            NavKey::Up if len > 0 => {
                self.focus = Some(match self.focus {
                    Some(f) if f > 0 => f - 1,
                    _ => len - 1,
                });
                None
            }
            NavKey::Enter => self.focus.and_then(|f| self.select(f)),
            _ => None,
        }
    }

    /// Pick the entry at `pos` of the open list and close it.
    pub fn select(&mut self, pos: usize) -> Option<String> {
        let value = self
            .matches
            .get(pos)
            .map(|&idx| self.candidates[idx].clone())?;
        self.close();
        Some(value)
    }
}
