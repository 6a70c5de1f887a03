/// Discrete rendering fidelity tier, chosen from zoom alone.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LodLevel {
    Full,
    Simplified,
    Placeholder,
    Block,
}

/// How nodes are painted at a given level.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeStyle {
    /// Rounded card with header band, kind badge and label.
    Chrome,
    /// Plain rectangle with a truncated label.
    Labeled,
    /// Rectangle with a bar where the label would be.
    Placeholder,
    /// Single flat block of colour.
    Block,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LodStyle {
    pub grid_cell: f32,
    pub grid_alpha: u8,
    pub node_style: NodeStyle,
    pub edge_width: f32,
}

const STYLES: [LodStyle; 4] = [
    LodStyle {
        grid_cell: 40.0,
        grid_alpha: 70,
        node_style: NodeStyle::Chrome,
        edge_width: 1.6,
    },
    LodStyle {
        grid_cell: 80.0,
        grid_alpha: 50,
        node_style: NodeStyle::Labeled,
        edge_width: 1.3,
    },
    LodStyle {
        grid_cell: 160.0,
        grid_alpha: 32,
        node_style: NodeStyle::Placeholder,
        edge_width: 1.0,
    },
    LodStyle {
        grid_cell: 320.0,
        grid_alpha: 18,
        node_style: NodeStyle::Block,
        edge_width: 0.7,
    },
];

impl LodLevel {
    pub fn from_zoom(zoom: f32) -> Self {
        if zoom >= 1.0 {
            Self::Full
        } else if zoom >= 0.6 {
            Self::Simplified
        } else if zoom >= 0.4 {
            Self::Placeholder
        } else {
            Self::Block
        }
    }

    pub fn ordinal(self) -> usize {
        match self {
            Self::Full => 0,
            Self::Simplified => 1,
            Self::Placeholder => 2,
            Self::Block => 3,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Simplified => "simplified",
            Self::Placeholder => "placeholder",
            Self::Block => "block",
        }
    }

    pub fn draws_node_detail(self) -> bool {
        self.ordinal() <= 1
    }

    pub fn draws_node_text(self) -> bool {
        self.ordinal() <= 1
    }

    pub fn draws_arrows(self) -> bool {
        self.ordinal() <= 1
    }

    pub fn uses_curved_edges(self) -> bool {
        self == Self::Full
    }

    pub fn style(self) -> LodStyle {
        STYLES[self.ordinal()]
    }
}
