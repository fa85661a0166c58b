use crate::error::{RelayError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GasMeter {
    limit: u64,
    used: u64,
}

impl GasMeter {
    pub fn new(limit: u64) -> Self {
        Self { limit, used: 0 }
    }

    pub fn charge(&mut self, gas: u64) -> Result<()> {
        let needed = self.used.checked_add(gas).ok_or(RelayError::ArithmeticOverflow)?;
        if needed > self.limit {
            return Err(RelayError::OutOfGas { limit: self.limit, needed });
        }
        self.used = needed;
        Ok(())
    }

    pub fn used(&self) -> u64 {
        self.used
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }
}
