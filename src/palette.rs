use crate::BlockState;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Deduplicating `BlockState <-> index` table. Index 0 is always air.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "Vec<BlockState>", into = "Vec<BlockState>")]
pub struct Palette {
    entries: Vec<BlockState>,
    index: FxHashMap<BlockState, usize>,
}

pub const AIR_INDEX: usize = 0;

impl Default for Palette {
    fn default() -> Self {
        Self::new()
    }
}

impl Palette {
    pub fn new() -> Self {
        let air = BlockState::air();
        let mut index = FxHashMap::default();
        index.insert(air.clone(), AIR_INDEX);
        Palette {
            entries: vec![air],
            index,
        }
    }

    pub fn get_or_insert(&mut self, state: &BlockState) -> usize {
        if let Some(&i) = self.index.get(state) {
            return i;
        }
        let i = self.entries.len();
        self.entries.push(state.clone());
        self.index.insert(state.clone(), i);
        i
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&BlockState> {
        self.entries.get(index)
    }

    pub fn index_of(&self, state: &BlockState) -> Option<usize> {
        self.index.get(state).copied()
    }

    #[inline]
    pub fn air(&self) -> &BlockState {
        &self.entries[AIR_INDEX]
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &BlockState> {
        self.entries.iter()
    }

    pub fn entries(&self) -> &[BlockState] {
        &self.entries
    }

    /// Rewrites each entry in place. Indices stay valid; when two entries end up
    /// equal, lookups resolve to the lower index.
    pub(crate) fn map_in_place(&mut self, mut f: impl FnMut(&BlockState) -> BlockState) {
        for i in 1..self.entries.len() {
            self.entries[i] = f(&self.entries[i]);
        }
        self.rebuild_index();
    }

    /// Builds a deduplicated palette holding only the `used` entries.
    /// Returns the new palette and an old-index -> new-index table.
    pub(crate) fn compacted(&self, used: &[bool]) -> (Palette, Vec<usize>) {
        let mut palette = Palette::new();
        let mut remap = vec![AIR_INDEX; self.entries.len()];
        for (old, state) in self.entries.iter().enumerate() {
            if old == AIR_INDEX || !used.get(old).copied().unwrap_or(false) {
                continue;
            }
            remap[old] = palette.get_or_insert(state);
        }
        (palette, remap)
    }

    fn rebuild_index(&mut self) {
        self.index = FxHashMap::default();
        for (i, state) in self.entries.iter().enumerate() {
            self.index.entry(state.clone()).or_insert(i);
        }
    }
}

impl From<Vec<BlockState>> for Palette {
    fn from(entries: Vec<BlockState>) -> Self {
        let mut palette = Palette { entries, index: FxHashMap::default() };
        if palette.entries.first().map_or(true, |s| !s.is_air()) {
            palette.entries.insert(AIR_INDEX, BlockState::air());
        }
        palette.rebuild_index();
        palette
    }
}

impl From<Palette> for Vec<BlockState> {
    fn from(palette: Palette) -> Self {
        palette.entries
    }
}
