use toolchat_types::DisplayBlock;

/// Ordered display blocks of the active conversation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Timeline {
    blocks: Vec<DisplayBlock>,
}

/// A block as it should be drawn: with the date separator that precedes it, if any
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderedBlock<'a> {
    pub separator: Option<&'a str>,
    pub block: &'a DisplayBlock,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.blocks.clear();
    }

    pub fn append(&mut self, blocks: impl IntoIterator<Item = DisplayBlock>) {
        self.blocks.extend(blocks);
    }

    pub fn push(&mut self, block: DisplayBlock) {
        self.blocks.push(block);
    }

    /// Swap in a whole reconstructed history
    pub fn replace(&mut self, blocks: Vec<DisplayBlock>) {
        self.blocks = blocks;
    }

    pub fn blocks(&self) -> &[DisplayBlock] {
        &self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Pair every block with its date separator.
    ///
    /// A separator precedes the first block and any block whose date differs
    /// from the block right before it.
    pub fn rendered(&self) -> Vec<RenderedBlock<'_>> {
        let mut previous: Option<&str> = None;

        self.blocks
            .iter()
            .map(|block| {
                let date = block.date();
                let separator = (previous != Some(date)).then_some(date);
                previous = Some(date);
                RenderedBlock { separator, block }
            })
            .collect()
    }

    /// Index of the most recent suggestion row
    pub fn latest_suggestion_index(&self) -> Option<usize> {
        self.blocks
            .iter()
            .rposition(|block| matches!(block, DisplayBlock::SuggestionRow { .. }))
    }
}
