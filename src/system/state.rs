//! Shared Combat State
//!
//! The only state shared between the firmware tasks:
//! - Combat authorization, owned by the startup sequencer
//! - Selected strategy, owned by the mode selector
//!
//! Both live in one [`CombatContext`], which the firmware keeps in a `static` and passes by
//! reference to every control cycle. The control loop only reads it.
//!
//! # Lifecycle
//! - Authorization goes `false -> true` exactly once and never back
//! - The strategy can be changed freely until combat is authorized, then it is locked

use core::cell::Cell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;

use crate::strategy::StrategyId;

/// One-way gate that releases the motors once the pre-fight delay has elapsed
pub struct CombatAuthorization {
    authorized: Mutex<CriticalSectionRawMutex, Cell<bool>>,
}

impl CombatAuthorization {
    pub const fn new() -> Self {
        Self {
            authorized: Mutex::new(Cell::new(false)),
        }
    }

    pub fn is_authorized(&self) -> bool {
        self.authorized.lock(|a| a.get())
    }

    /// Authorizes combat. Returns `true` only for the call that flipped the gate.
    pub fn authorize(&self) -> bool {
        self.authorized.lock(|a| !a.replace(true))
    }
}

impl Default for CombatAuthorization {
    fn default() -> Self {
        Self::new()
    }
}

/// Strategy picked on the mode button before the fight
pub struct ModeSelection {
    strategy: Mutex<CriticalSectionRawMutex, Cell<StrategyId>>,
}

impl ModeSelection {
    pub const fn new(initial: StrategyId) -> Self {
        Self {
            strategy: Mutex::new(Cell::new(initial)),
        }
    }

    pub fn current(&self) -> StrategyId {
        self.strategy.lock(|s| s.get())
    }

    fn set(&self, id: StrategyId) {
        self.strategy.lock(|s| s.set(id));
    }
}

/// Everything a control cycle needs to know about the outside world besides its sensors
pub struct CombatContext {
    pub authorization: CombatAuthorization,
    mode: ModeSelection,
}

impl CombatContext {
    pub const fn new(initial: StrategyId) -> Self {
        Self {
            authorization: CombatAuthorization::new(),
            mode: ModeSelection::new(initial),
        }
    }

    pub fn is_authorized(&self) -> bool {
        self.authorization.is_authorized()
    }

    /// Releases the motors. Called once by the startup sequencer.
    pub fn authorize(&self) -> bool {
        let flipped = self.authorization.authorize();
        if flipped {
            info!("combat authorized, strategy {:?}", self.strategy());
        }
        flipped
    }

    /// Strategy the next control cycle will run
    pub fn strategy(&self) -> StrategyId {
        self.mode.current()
    }

    /// Picks a strategy directly. Ignored once combat has started.
    pub fn select_strategy(&self, id: StrategyId) -> bool {
        if self.is_authorized() {
            warn!("strategy locked during combat, ignoring {:?}", id);
            return false;
        }
        self.mode.set(id);
        true
    }

    /// Advances to the next strategy, as one press of the mode button does.
    /// Returns the new strategy, or `None` once combat has started.
    pub fn cycle_strategy(&self) -> Option<StrategyId> {
        let next = self.strategy().next();
        if self.select_strategy(next) {
            info!("strategy selected: {:?}", next);
            Some(next)
        } else {
            None
        }
    }
}

impl Default for CombatContext {
    fn default() -> Self {
        Self::new(StrategyId::Direct)
    }
}
