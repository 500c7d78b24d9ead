//! ALU opcode tables.
//!
//! Every opcode is listed exactly once in `for_each_alu_op2!` or
//! `for_each_alu_op3!` together with its source-operand count and its
//! hardware encoding per bytecode revision (`None` where a revision does
//! not implement the op). The macros below generate the enums and their
//! accessors from those tables; the issue-unit classifiers that drive
//! group scheduling live beside them.

use crate::family::ChipRev;

/// Calls the given macro with every two-operand-form ALU opcode.
///
/// Row shape: `snake_name = VariantName { srcs, r600, eg }` where `r600`
/// is the encoding on R600/R700 and `eg` the encoding on Evergreen and
/// Cayman.
macro_rules! for_each_alu_op2 {
    ($mac:ident) => {
        $mac! {
            add = Add { srcs: 2, r600: Some(0x00), eg: Some(0x00) };
            mul = Mul { srcs: 2, r600: Some(0x01), eg: Some(0x01) };
            mul_ieee = MulIeee { srcs: 2, r600: Some(0x02), eg: Some(0x02) };
            max = Max { srcs: 2, r600: Some(0x03), eg: Some(0x03) };
            min = Min { srcs: 2, r600: Some(0x04), eg: Some(0x04) };
            max_dx10 = MaxDx10 { srcs: 2, r600: Some(0x05), eg: Some(0x05) };
            min_dx10 = MinDx10 { srcs: 2, r600: Some(0x06), eg: Some(0x06) };
            sete = Sete { srcs: 2, r600: Some(0x08), eg: Some(0x08) };
            setgt = Setgt { srcs: 2, r600: Some(0x09), eg: Some(0x09) };
            setge = Setge { srcs: 2, r600: Some(0x0A), eg: Some(0x0A) };
            setne = Setne { srcs: 2, r600: Some(0x0B), eg: Some(0x0B) };
            sete_dx10 = SeteDx10 { srcs: 2, r600: Some(0x0C), eg: Some(0x0C) };
            setgt_dx10 = SetgtDx10 { srcs: 2, r600: Some(0x0D), eg: Some(0x0D) };
            setge_dx10 = SetgeDx10 { srcs: 2, r600: Some(0x0E), eg: Some(0x0E) };
            setne_dx10 = SetneDx10 { srcs: 2, r600: Some(0x0F), eg: Some(0x0F) };
            fract = Fract { srcs: 1, r600: Some(0x10), eg: Some(0x10) };
            trunc = Trunc { srcs: 1, r600: Some(0x11), eg: Some(0x11) };
            ceil = Ceil { srcs: 1, r600: Some(0x12), eg: Some(0x12) };
            rndne = Rndne { srcs: 1, r600: Some(0x13), eg: Some(0x13) };
            floor = Floor { srcs: 1, r600: Some(0x14), eg: Some(0x14) };
            mova = Mova { srcs: 1, r600: Some(0x15), eg: None };
            mova_floor = MovaFloor { srcs: 1, r600: Some(0x16), eg: None };
            mova_int = MovaInt { srcs: 1, r600: Some(0x18), eg: Some(0xCC) };
            mov = Mov { srcs: 1, r600: Some(0x19), eg: Some(0x18) };
            nop = Nop { srcs: 0, r600: Some(0x1A), eg: Some(0x19) };
            pred_setgt_uint = PredSetgtUint { srcs: 2, r600: Some(0x1E), eg: Some(0x1E) };
            pred_setge_uint = PredSetgeUint { srcs: 2, r600: Some(0x1F), eg: Some(0x1F) };
            pred_sete = PredSete { srcs: 2, r600: Some(0x20), eg: Some(0x20) };
            pred_setgt = PredSetgt { srcs: 2, r600: Some(0x21), eg: Some(0x21) };
            pred_setge = PredSetge { srcs: 2, r600: Some(0x22), eg: Some(0x22) };
            pred_setne = PredSetne { srcs: 2, r600: Some(0x23), eg: Some(0x23) };
            pred_set_inv = PredSetInv { srcs: 1, r600: Some(0x24), eg: Some(0x24) };
            pred_set_pop = PredSetPop { srcs: 1, r600: Some(0x25), eg: Some(0x25) };
            pred_set_clr = PredSetClr { srcs: 0, r600: Some(0x26), eg: Some(0x26) };
            pred_set_restore = PredSetRestore { srcs: 1, r600: Some(0x27), eg: Some(0x27) };
            pred_sete_push = PredSetePush { srcs: 2, r600: Some(0x28), eg: Some(0x28) };
            pred_setgt_push = PredSetgtPush { srcs: 2, r600: Some(0x29), eg: Some(0x29) };
            pred_setge_push = PredSetgePush { srcs: 2, r600: Some(0x2A), eg: Some(0x2A) };
            pred_setne_push = PredSetnePush { srcs: 2, r600: Some(0x2B), eg: Some(0x2B) };
            kille = Kille { srcs: 2, r600: Some(0x2C), eg: Some(0x2C) };
            killgt = Killgt { srcs: 2, r600: Some(0x2D), eg: Some(0x2D) };
            killge = Killge { srcs: 2, r600: Some(0x2E), eg: Some(0x2E) };
            killne = Killne { srcs: 2, r600: Some(0x2F), eg: Some(0x2F) };
            and_int = AndInt { srcs: 2, r600: Some(0x30), eg: Some(0x30) };
            or_int = OrInt { srcs: 2, r600: Some(0x31), eg: Some(0x31) };
            xor_int = XorInt { srcs: 2, r600: Some(0x32), eg: Some(0x32) };
            not_int = NotInt { srcs: 1, r600: Some(0x33), eg: Some(0x33) };
            add_int = AddInt { srcs: 2, r600: Some(0x34), eg: Some(0x34) };
            sub_int = SubInt { srcs: 2, r600: Some(0x35), eg: Some(0x35) };
            max_int = MaxInt { srcs: 2, r600: Some(0x36), eg: Some(0x36) };
            min_int = MinInt { srcs: 2, r600: Some(0x37), eg: Some(0x37) };
            max_uint = MaxUint { srcs: 2, r600: Some(0x38), eg: Some(0x38) };
            min_uint = MinUint { srcs: 2, r600: Some(0x39), eg: Some(0x39) };
            sete_int = SeteInt { srcs: 2, r600: Some(0x3A), eg: Some(0x3A) };
            setgt_int = SetgtInt { srcs: 2, r600: Some(0x3B), eg: Some(0x3B) };
            setge_int = SetgeInt { srcs: 2, r600: Some(0x3C), eg: Some(0x3C) };
            setne_int = SetneInt { srcs: 2, r600: Some(0x3D), eg: Some(0x3D) };
            setgt_uint = SetgtUint { srcs: 2, r600: Some(0x3E), eg: Some(0x3E) };
            setge_uint = SetgeUint { srcs: 2, r600: Some(0x3F), eg: Some(0x3F) };
            killgt_uint = KillgtUint { srcs: 2, r600: Some(0x40), eg: Some(0x40) };
            killge_uint = KillgeUint { srcs: 2, r600: Some(0x41), eg: Some(0x41) };
            pred_sete_int = PredSeteInt { srcs: 2, r600: Some(0x42), eg: Some(0x42) };
            pred_setgt_int = PredSetgtInt { srcs: 2, r600: Some(0x43), eg: Some(0x43) };
            pred_setge_int = PredSetgeInt { srcs: 2, r600: Some(0x44), eg: Some(0x44) };
            pred_setne_int = PredSetneInt { srcs: 2, r600: Some(0x45), eg: Some(0x45) };
            kille_int = KilleInt { srcs: 2, r600: Some(0x46), eg: Some(0x46) };
            killgt_int = KillgtInt { srcs: 2, r600: Some(0x47), eg: Some(0x47) };
            killge_int = KillgeInt { srcs: 2, r600: Some(0x48), eg: Some(0x48) };
            killne_int = KillneInt { srcs: 2, r600: Some(0x49), eg: Some(0x49) };
            pred_sete_push_int = PredSetePushInt { srcs: 2, r600: Some(0x4A), eg: Some(0x4A) };
            pred_setgt_push_int = PredSetgtPushInt { srcs: 2, r600: Some(0x4B), eg: Some(0x4B) };
            pred_setge_push_int = PredSetgePushInt { srcs: 2, r600: Some(0x4C), eg: Some(0x4C) };
            pred_setne_push_int = PredSetnePushInt { srcs: 2, r600: Some(0x4D), eg: Some(0x4D) };
            pred_setlt_push_int = PredSetltPushInt { srcs: 2, r600: Some(0x4E), eg: Some(0x4E) };
            pred_setle_push_int = PredSetlePushInt { srcs: 2, r600: Some(0x4F), eg: Some(0x4F) };
            dot4 = Dot4 { srcs: 2, r600: Some(0x50), eg: Some(0xBE) };
            dot4_ieee = Dot4Ieee { srcs: 2, r600: Some(0x51), eg: Some(0xBF) };
            cube = Cube { srcs: 2, r600: Some(0x52), eg: Some(0xC0) };
            max4 = Max4 { srcs: 1, r600: Some(0x53), eg: Some(0xC1) };
            exp_ieee = ExpIeee { srcs: 1, r600: Some(0x61), eg: Some(0x81) };
            log_clamped = LogClamped { srcs: 1, r600: Some(0x62), eg: Some(0x82) };
            log_ieee = LogIeee { srcs: 1, r600: Some(0x63), eg: Some(0x83) };
            recip_clamped = RecipClamped { srcs: 1, r600: Some(0x64), eg: Some(0x84) };
            recip_ff = RecipFf { srcs: 1, r600: Some(0x65), eg: Some(0x85) };
            recip_ieee = RecipIeee { srcs: 1, r600: Some(0x66), eg: Some(0x86) };
            recipsqrt_clamped = RecipsqrtClamped { srcs: 1, r600: Some(0x67), eg: Some(0x87) };
            recipsqrt_ff = RecipsqrtFf { srcs: 1, r600: Some(0x68), eg: Some(0x88) };
            recipsqrt_ieee = RecipsqrtIeee { srcs: 1, r600: Some(0x69), eg: Some(0x89) };
            sqrt_ieee = SqrtIeee { srcs: 1, r600: Some(0x6A), eg: Some(0x8A) };
            flt_to_int = FltToInt { srcs: 1, r600: Some(0x6B), eg: Some(0x50) };
            int_to_flt = IntToFlt { srcs: 1, r600: Some(0x6C), eg: Some(0x9B) };
            uint_to_flt = UintToFlt { srcs: 1, r600: Some(0x6D), eg: Some(0x9C) };
            sin = Sin { srcs: 1, r600: Some(0x6E), eg: Some(0x8D) };
            cos = Cos { srcs: 1, r600: Some(0x6F), eg: Some(0x8E) };
            ashr_int = AshrInt { srcs: 2, r600: Some(0x70), eg: Some(0x15) };
            lshr_int = LshrInt { srcs: 2, r600: Some(0x71), eg: Some(0x16) };
            lshl_int = LshlInt { srcs: 2, r600: Some(0x72), eg: Some(0x17) };
            mullo_int = MulloInt { srcs: 2, r600: Some(0x73), eg: Some(0x8F) };
            mulhi_int = MulhiInt { srcs: 2, r600: Some(0x74), eg: Some(0x90) };
            mullo_uint = MulloUint { srcs: 2, r600: Some(0x75), eg: Some(0x91) };
            mulhi_uint = MulhiUint { srcs: 2, r600: Some(0x76), eg: Some(0x92) };
            recip_int = RecipInt { srcs: 1, r600: Some(0x77), eg: Some(0x93) };
            recip_uint = RecipUint { srcs: 1, r600: Some(0x78), eg: Some(0x94) };
            flt_to_uint = FltToUint { srcs: 1, r600: Some(0x79), eg: Some(0x9A) };
            flt_to_int_floor = FltToIntFloor { srcs: 1, r600: None, eg: Some(0xB1) };
            interp_xy = InterpXy { srcs: 2, r600: None, eg: Some(0xD6) };
            interp_zw = InterpZw { srcs: 2, r600: None, eg: Some(0xD7) };
        }
    };
}

/// Calls the given macro with every three-operand-form ALU opcode.
macro_rules! for_each_alu_op3 {
    ($mac:ident) => {
        $mac! {
            mul_lit = MulLit { srcs: 3, r600: Some(0x0C), eg: Some(0x1F) };
            mul_lit_m2 = MulLitM2 { srcs: 3, r600: Some(0x0D), eg: None };
            mul_lit_m4 = MulLitM4 { srcs: 3, r600: Some(0x0E), eg: None };
            mul_lit_d2 = MulLitD2 { srcs: 3, r600: Some(0x0F), eg: None };
            muladd = Muladd { srcs: 3, r600: Some(0x10), eg: Some(0x14) };
            muladd_m2 = MuladdM2 { srcs: 3, r600: Some(0x11), eg: Some(0x15) };
            muladd_m4 = MuladdM4 { srcs: 3, r600: Some(0x12), eg: Some(0x16) };
            muladd_d2 = MuladdD2 { srcs: 3, r600: Some(0x13), eg: Some(0x17) };
            muladd_ieee = MuladdIeee { srcs: 3, r600: Some(0x14), eg: Some(0x18) };
            cnde = Cnde { srcs: 3, r600: Some(0x18), eg: Some(0x19) };
            cndgt = Cndgt { srcs: 3, r600: Some(0x19), eg: Some(0x1A) };
            cndge = Cndge { srcs: 3, r600: Some(0x1A), eg: Some(0x1B) };
            cnde_int = CndeInt { srcs: 3, r600: Some(0x1C), eg: Some(0x1C) };
            cndgt_int = CndgtInt { srcs: 3, r600: Some(0x1D), eg: Some(0x1D) };
            cndge_int = CndgeInt { srcs: 3, r600: Some(0x1E), eg: Some(0x1E) };
        }
    };
}

macro_rules! define_alu_op2 {
    ($($snake:ident = $Name:ident { srcs: $srcs:expr, r600: $r600:expr, eg: $eg:expr };)*) => {
        /// An ALU opcode in the two-operand encoding form.
        ///
        /// The form also covers zero- and one-source operations; "op2"
        /// only names the instruction-word layout.
        #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
        #[expect(missing_docs, reason = "self-describing mnemonics")]
        pub enum AluOp2 {
            $($Name,)*
        }

        impl AluOp2 {
            /// Source operands this opcode consumes.
            pub fn num_srcs(self) -> usize {
                match self {
                    $(Self::$Name => $srcs,)*
                }
            }

            /// Hardware encoding on the given revision, or `None` if the
            /// revision does not implement the op.
            pub fn code(self, rev: ChipRev) -> Option<u32> {
                match rev {
                    ChipRev::R600 | ChipRev::R700 => match self {
                        $(Self::$Name => $r600,)*
                    },
                    ChipRev::Evergreen | ChipRev::Cayman => match self {
                        $(Self::$Name => $eg,)*
                    },
                }
            }

            /// Lower-case mnemonic.
            pub fn name(self) -> &'static str {
                match self {
                    $(Self::$Name => stringify!($snake),)*
                }
            }
        }
    };
}

macro_rules! define_alu_op3 {
    ($($snake:ident = $Name:ident { srcs: $srcs:expr, r600: $r600:expr, eg: $eg:expr };)*) => {
        /// An ALU opcode in the three-operand encoding form.
        #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
        #[expect(missing_docs, reason = "self-describing mnemonics")]
        pub enum AluOp3 {
            $($Name,)*
        }

        impl AluOp3 {
            /// Source operands this opcode consumes.
            pub fn num_srcs(self) -> usize {
                match self {
                    $(Self::$Name => $srcs,)*
                }
            }

            /// Hardware encoding on the given revision, or `None` if the
            /// revision does not implement the op.
            pub fn code(self, rev: ChipRev) -> Option<u32> {
                match rev {
                    ChipRev::R600 | ChipRev::R700 => match self {
                        $(Self::$Name => $r600,)*
                    },
                    ChipRev::Evergreen | ChipRev::Cayman => match self {
                        $(Self::$Name => $eg,)*
                    },
                }
            }

            /// Lower-case mnemonic.
            pub fn name(self) -> &'static str {
                match self {
                    $(Self::$Name => stringify!($snake),)*
                }
            }
        }
    };
}

for_each_alu_op2!(define_alu_op2);
for_each_alu_op3!(define_alu_op3);

/// Any ALU opcode.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum AluOp {
    /// Two-operand encoding form.
    Op2(AluOp2),
    /// Three-operand encoding form.
    Op3(AluOp3),
}

impl From<AluOp2> for AluOp {
    fn from(op: AluOp2) -> Self {
        AluOp::Op2(op)
    }
}

impl From<AluOp3> for AluOp {
    fn from(op: AluOp3) -> Self {
        AluOp::Op3(op)
    }
}

impl AluOp {
    /// Source operands this opcode consumes.
    pub fn num_srcs(self) -> usize {
        match self {
            AluOp::Op2(op) => op.num_srcs(),
            AluOp::Op3(op) => op.num_srcs(),
        }
    }

    /// Hardware encoding on the given revision, or `None` if the
    /// revision does not implement the op.
    pub fn code(self, rev: ChipRev) -> Option<u32> {
        match self {
            AluOp::Op2(op) => op.code(rev),
            AluOp::Op3(op) => op.code(rev),
        }
    }

    /// Lower-case mnemonic.
    pub fn name(self) -> &'static str {
        match self {
            AluOp::Op2(op) => op.name(),
            AluOp::Op3(op) => op.name(),
        }
    }

    /// Whether the op uses the three-operand word layout.
    pub fn is_op3(self) -> bool {
        matches!(self, AluOp::Op3(_))
    }

    /// Reductions compute one value across all four vector slots.
    pub(crate) fn is_reduction(self) -> bool {
        matches!(
            self,
            AluOp::Op2(AluOp2::Dot4 | AluOp2::Dot4Ieee | AluOp2::Cube | AluOp2::Max4)
        )
    }

    /// CUBE is the one reduction whose slots produce distinct values.
    pub(crate) fn is_cube(self) -> bool {
        self == AluOp::Op2(AluOp2::Cube)
    }

    /// Address-register loads.
    pub(crate) fn is_address_load(self, rev: ChipRev) -> bool {
        match self {
            AluOp::Op2(AluOp2::MovaInt) => true,
            AluOp::Op2(AluOp2::Mova | AluOp2::MovaFloor) => rev < ChipRev::Evergreen,
            _ => false,
        }
    }

    /// Ops restricted to the x/y/z/w vector slots.
    pub(crate) fn is_vector_only(self, rev: ChipRev) -> bool {
        if self.is_reduction() || self.is_address_load(rev) {
            return true;
        }
        // FLT_TO_INT_FLOOR is vector-only on Evergreen despite what the
        // documentation says; FLT_TO_INT itself can go to either unit
        // there.
        rev == ChipRev::Evergreen && self == AluOp::Op2(AluOp2::FltToIntFloor)
    }

    /// Ops restricted to the transcendental slot.
    pub(crate) fn is_trans_only(self, rev: ChipRev) -> bool {
        match self {
            AluOp::Op2(op) => {
                use AluOp2::*;
                match op {
                    AshrInt | LshrInt | LshlInt | MulhiInt | MulhiUint | MulloInt
                    | MulloUint | RecipInt | RecipUint | IntToFlt | UintToFlt | Cos | Sin
                    | ExpIeee | LogClamped | LogIeee | RecipClamped | RecipFf | RecipIeee
                    | RecipsqrtClamped | RecipsqrtFf | RecipsqrtIeee | SqrtIeee => true,
                    FltToInt => rev < ChipRev::Evergreen,
                    _ => false,
                }
            }
            AluOp::Op3(op) => {
                use AluOp3::*;
                match op {
                    MulLit => true,
                    MulLitM2 | MulLitM4 | MulLitD2 => rev < ChipRev::Evergreen,
                    _ => false,
                }
            }
        }
    }

    /// Ops any issue slot may execute.
    pub(crate) fn is_any_unit(self, rev: ChipRev) -> bool {
        !self.is_trans_only(rev) && !self.is_vector_only(rev)
    }

    /// KILL and PRED_SET ops write the execute mask or the predicate
    /// stack; a group may contain at most one of them.
    pub(crate) fn updates_exec_state(self) -> bool {
        let AluOp::Op2(op) = self else {
            return false;
        };
        use AluOp2::*;
        matches!(
            op,
            Kille
                | Killgt
                | Killge
                | Killne
                | KillgtUint
                | KillgeUint
                | KilleInt
                | KillgtInt
                | KillgeInt
                | KillneInt
                | PredSetgtUint
                | PredSetgeUint
                | PredSete
                | PredSetgt
                | PredSetge
                | PredSetne
                | PredSetInv
                | PredSetPop
                | PredSetClr
                | PredSetRestore
                | PredSetePush
                | PredSetgtPush
                | PredSetgePush
                | PredSetnePush
                | PredSeteInt
                | PredSetgtInt
                | PredSetgeInt
                | PredSetneInt
                | PredSetePushInt
                | PredSetgtPushInt
                | PredSetgePushInt
                | PredSetnePushInt
                | PredSetltPushInt
                | PredSetlePushInt
        )
    }
}
