//! Fee schedule of a relayer instance.
//!
//! Every parameter is held in a [`Ratchet`]: the operator may lower it or
//! leave it unchanged, never raise it.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::Amount;

/// A value that can only move down.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(transparent)]
pub struct Ratchet<T>(T);

impl<T: PartialOrd + Copy> Ratchet<T> {
    pub fn new(value: T) -> Self {
        Self(value)
    }

    pub fn get(&self) -> T {
        self.0
    }

    /// The ratchet moved to `next`, or `None` if that would raise it.
    pub fn lowered(&self, next: T) -> Option<Self> {
        if next <= self.0 {
            Some(Self(next))
        } else {
            None
        }
    }
}

/// Fee pair charged for one tier.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct TierFees {
    pub platform_fee: Amount,
    pub claimer_fee: Amount,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeeTier {
    Base,
    /// Selected when the principal is under-collateralized and their debt gets settled.
    Guaranteed,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeeParameter {
    PlatformFee,
    ClaimerFee,
    PlatformFeeGuaranteed,
    ClaimerFeeGuaranteed,
    GasOffsetCorrection,
}

impl fmt::Display for FeeParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            FeeParameter::PlatformFee => "Platform fee should be less than initial one set",
            FeeParameter::ClaimerFee => "Claimer fee should be less than initial one set",
            FeeParameter::PlatformFeeGuaranteed => {
                "Platform fee for Guaranteed AutoClaim should be less than initial one set"
            }
            FeeParameter::ClaimerFeeGuaranteed => {
                "Claimer fee for Guaranteed AutoClaim should be less than initial one set"
            }
            FeeParameter::GasOffsetCorrection => "Gas correction should be less than initial one set",
        };
        f.write_str(msg)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeeChangeError {
    TooHigh(FeeParameter),
    /// Guaranteed tier supplied to a base schedule, or omitted for a tiered one.
    TierMismatch,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
struct RatchetedTier {
    platform_fee: Ratchet<Amount>,
    claimer_fee: Ratchet<Amount>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeSchedule {
    platform_fee: Ratchet<Amount>,
    claimer_fee: Ratchet<Amount>,
    guaranteed: Option<RatchetedTier>,
    gas_offset_correction: Ratchet<u64>,
}

impl FeeSchedule {
    /// Schedule for a base-version relayer (no guaranteed tier).
    pub fn base(base: TierFees, gas_offset_correction: u64) -> Self {
        Self {
            platform_fee: Ratchet::new(base.platform_fee),
            claimer_fee: Ratchet::new(base.claimer_fee),
            guaranteed: None,
            gas_offset_correction: Ratchet::new(gas_offset_correction),
        }
    }

    pub fn tiered(base: TierFees, guaranteed: TierFees, gas_offset_correction: u64) -> Self {
        Self {
            guaranteed: Some(RatchetedTier {
                platform_fee: Ratchet::new(guaranteed.platform_fee),
                claimer_fee: Ratchet::new(guaranteed.claimer_fee),
            }),
            ..Self::base(base, gas_offset_correction)
        }
    }

    pub fn is_tiered(&self) -> bool {
        self.guaranteed.is_some()
    }

    pub fn base_fees(&self) -> TierFees {
        TierFees {
            platform_fee: self.platform_fee.get(),
            claimer_fee: self.claimer_fee.get(),
        }
    }

    pub fn guaranteed_fees(&self) -> Option<TierFees> {
        self.guaranteed.map(|g| TierFees {
            platform_fee: g.platform_fee.get(),
            claimer_fee: g.claimer_fee.get(),
        })
    }

    /// Fees for `tier`. A guaranteed lookup on a base schedule falls back to base fees.
    pub fn fees_for(&self, tier: FeeTier) -> TierFees {
        match tier {
            FeeTier::Base => self.base_fees(),
            FeeTier::Guaranteed => self.guaranteed_fees().unwrap_or_else(|| self.base_fees()),
        }
    }

    pub fn gas_offset_correction(&self) -> u64 {
        self.gas_offset_correction.get()
    }

    /// Lower every parameter at once. Nothing changes unless every new value passes.
    pub fn change(
        &mut self,
        base: TierFees,
        guaranteed: Option<TierFees>,
        gas_offset_correction: u64,
    ) -> Result<(), FeeChangeError> {
        use FeeChangeError::TooHigh;

        let platform_fee = self
            .platform_fee
            .lowered(base.platform_fee)
            .ok_or(TooHigh(FeeParameter::PlatformFee))?;
        let claimer_fee = self
            .claimer_fee
            .lowered(base.claimer_fee)
            .ok_or(TooHigh(FeeParameter::ClaimerFee))?;

        let next_guaranteed = match (self.guaranteed, guaranteed) {
            (Some(current), Some(requested)) => Some(RatchetedTier {
                platform_fee: current
                    .platform_fee
                    .lowered(requested.platform_fee)
                    .ok_or(TooHigh(FeeParameter::PlatformFeeGuaranteed))?,
                claimer_fee: current
                    .claimer_fee
                    .lowered(requested.claimer_fee)
                    .ok_or(TooHigh(FeeParameter::ClaimerFeeGuaranteed))?,
            }),
            (None, None) => None,
            _ => return Err(FeeChangeError::TierMismatch),
        };

        let gas_offset_correction = self
            .gas_offset_correction
            .lowered(gas_offset_correction)
            .ok_or(TooHigh(FeeParameter::GasOffsetCorrection))?;

        *self = Self {
            platform_fee,
            claimer_fee,
            guaranteed: next_guaranteed,
            gas_offset_correction,
        };
        Ok(())
    }
}
