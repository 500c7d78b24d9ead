//! Chip families and the ISA revisions they decode.

/// The R600-class ASICs this assembler produces code for.
///
/// Individual parts differ in clocks and unit counts, but for bytecode
/// purposes they collapse onto a handful of revisions; see
/// [`ChipFamily::chip_rev`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[expect(missing_docs, reason = "self-describing ASIC names")]
pub enum ChipFamily {
    R600,
    Rv610,
    Rv630,
    Rv670,
    Rv620,
    Rv635,
    Rs780,
    Rs880,
    Rv770,
    Rv730,
    Rv710,
    Rv740,
    Cedar,
    Redwood,
    Juniper,
    Cypress,
    Hemlock,
    Palm,
    Sumo,
    Sumo2,
    Barts,
    Turks,
    Caicos,
    Cayman,
}

/// Bytecode revision of the shader sequencer.
///
/// Ordered oldest to newest, so range checks like `rev >= ChipRev::R700`
/// read naturally.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ChipRev {
    /// Original R600 encodings.
    R600,
    /// RV770 generation; wider ALU opcode field, narrower constant-file
    /// read ports.
    R700,
    /// Evergreen and the VLIW5 Northern Islands parts.
    Evergreen,
    /// Cayman; the VLIW went four wide and the vertex cache is gone.
    Cayman,
}

impl ChipFamily {
    /// The bytecode revision this ASIC decodes.
    pub fn chip_rev(self) -> ChipRev {
        use ChipFamily::*;
        match self {
            R600 | Rv610 | Rv630 | Rv670 | Rv620 | Rv635 | Rs780 | Rs880 => ChipRev::R600,
            Rv770 | Rv730 | Rv710 | Rv740 => ChipRev::R700,
            Cedar | Redwood | Juniper | Cypress | Hemlock | Palm | Sumo | Sumo2 | Barts
            | Turks | Caicos => ChipRev::Evergreen,
            Cayman => ChipRev::Cayman,
        }
    }
}

impl ChipRev {
    /// Issue slots in one ALU group: x/y/z/w plus the transcendental
    /// unit, which Cayman dropped.
    pub fn max_slots(self) -> usize {
        if self == ChipRev::Cayman {
            4
        } else {
            5
        }
    }

    /// Fetch records one clause may hold before a new one must start.
    pub(crate) fn fetch_clause_limit(self) -> u32 {
        match self {
            ChipRev::R600 => 8,
            ChipRev::R700 => 16,
            ChipRev::Evergreen | ChipRev::Cayman => 64,
        }
    }

    /// First fetch resource slot available to vertex buffers.
    pub(crate) fn fetch_resource_start(self) -> u32 {
        if self >= ChipRev::Evergreen {
            0
        } else {
            160
        }
    }
}
