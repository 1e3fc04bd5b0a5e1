use solana_sdk::instruction::Instruction;
use solana_sdk::pubkey::Pubkey;
use tracing::info;

use crate::error::LpResult;
use crate::instructions::initialize_tick_array;
use crate::pool::derive_tick_array_address;
use crate::rpc::AccountSource;
use crate::ticks::{TickArrayHelper, TickRange};

/// A tick array the position will reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickArrayRef {
    pub start_index: i32,
    pub address: Pubkey,
    pub initialized: bool,
}

#[derive(Debug, Clone)]
pub struct Provisioning {
    pub lower: TickArrayRef,
    pub upper: TickArrayRef,
    /// `initialize_tick_array` instructions for arrays that do not exist yet.
    /// Only the fee payer signs these.
    pub instructions: Vec<Instruction>,
}

impl Provisioning {
    pub fn shares_array(&self) -> bool {
        self.lower.address == self.upper.address
    }
}

async fn inspect_array<S: AccountSource + ?Sized>(
    source: &S,
    program_id: &Pubkey,
    whirlpool: &Pubkey,
    start_index: i32,
) -> LpResult<TickArrayRef> {
    let address = derive_tick_array_address(program_id, whirlpool, start_index);
    // An account under a foreign owner is not a usable tick array either.
    let initialized = matches!(source.get_account(&address).await?, Some(account) if account.owner == *program_id);
    Ok(TickArrayRef {
        start_index,
        address,
        initialized,
    })
}

/// Checks the arrays holding both range bounds and emits init instructions
/// for the missing ones. A shared array is read and initialized once.
pub async fn provision_tick_arrays<S: AccountSource + ?Sized>(
    source: &S,
    program_id: &Pubkey,
    whirlpool: &Pubkey,
    funder: &Pubkey,
    range: &TickRange,
    helper: &TickArrayHelper,
) -> LpResult<Provisioning> {
    let lower_start = helper.array_start_index(range.lower);
    let upper_start = helper.array_start_index(range.upper);
    info!(lower_start, upper_start, "tick array start indices");

    let lower = inspect_array(source, program_id, whirlpool, lower_start).await?;
    let upper = if upper_start == lower_start {
        lower
    } else {
        inspect_array(source, program_id, whirlpool, upper_start).await?
    };

    let mut instructions = Vec::new();
    let mut pending = vec![lower];
    if upper.address != lower.address {
        pending.push(upper);
    }
    for array in pending {
        if array.initialized {
            info!(start = array.start_index, address = %array.address, "tick array exists");
            continue;
        }
        info!(start = array.start_index, address = %array.address, "tick array missing, adding initialization");
        instructions.push(initialize_tick_array(
            program_id,
            whirlpool,
            funder,
            &array.address,
            array.start_index,
        )?);
    }

    Ok(Provisioning {
        lower,
        upper,
        instructions,
    })
}
