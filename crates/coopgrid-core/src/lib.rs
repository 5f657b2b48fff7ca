//! Core engine for the coopgrid workspace: an evolutionary spatial game
//! (generalized Prisoner's Dilemma) on a toroidal lattice.
//!
//! Every cell holds a binary strategy and re-evaluates it once per iteration
//! by imitating a higher-scoring Moore neighbor. All decisions in one
//! iteration read a frozen snapshot of the previous grid; the next grid is
//! materialized separately and swapped in only after every cell has decided.

use rand::{Rng, RngCore, SeedableRng, rngs::SmallRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tracing::{debug, info};

/// Errors surfaced by engine construction and grid import.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    /// Indicates an invalid configuration value. Raised before any iteration
    /// runs; a failed construction never produces history.
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
    /// A raw cell value outside {0, 1} reached the strategy-grid boundary.
    /// Corrupted state is fatal and never coerced.
    #[error("invalid strategy value {value} at ({row}, {col})")]
    InvalidStrategy { value: u8, row: usize, col: usize },
}

/// One of the two cell strategies.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default,
)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Strategy {
    #[default]
    Defect = 0,
    Cooperate = 1,
}

impl Strategy {
    /// The other strategy.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Defect => Self::Cooperate,
            Self::Cooperate => Self::Defect,
        }
    }

    /// Wire value for the rendering collaborator ({0, 1}).
    #[must_use]
    pub const fn as_raw(self) -> u8 {
        self as u8
    }

    /// Parse a wire value, rejecting anything outside {0, 1}.
    #[must_use]
    pub const fn from_raw(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Defect),
            1 => Some(Self::Cooperate),
            _ => None,
        }
    }
}

/// Classification of a cell's strategy transition between consecutive
/// iterations, one per cell per iteration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum ChangeCode {
    StayDefect = 0,
    StayCooperate = 1,
    DefectToCooperate = 2,
    CooperateToDefect = 3,
}

impl ChangeCode {
    /// Derive the transition code from the old and new strategies.
    #[must_use]
    pub const fn classify(old: Strategy, new: Strategy) -> Self {
        match (old, new) {
            (Strategy::Defect, Strategy::Defect) => Self::StayDefect,
            (Strategy::Cooperate, Strategy::Cooperate) => Self::StayCooperate,
            (Strategy::Defect, Strategy::Cooperate) => Self::DefectToCooperate,
            (Strategy::Cooperate, Strategy::Defect) => Self::CooperateToDefect,
        }
    }

    /// Wire value for the rendering collaborator ({0, 1, 2, 3}).
    #[must_use]
    pub const fn as_raw(self) -> u8 {
        self as u8
    }
}

/// Payoff scalars for one pairwise game. Immutable after construction and
/// constrained to the generalized Prisoner's Dilemma ordering `t > r > p > s`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PayoffTable {
    t: f64,
    r: f64,
    p: f64,
    s: f64,
}

impl Default for PayoffTable {
    fn default() -> Self {
        Self {
            t: 1.3,
            r: 1.0,
            p: 0.5,
            s: 0.1,
        }
    }
}

impl PayoffTable {
    /// Construct a table, failing unless `t > r > p > s` holds strictly.
    pub fn new(t: f64, r: f64, p: f64, s: f64) -> Result<Self, EngineError> {
        let table = Self { t, r, p, s };
        table.check_ordering()?;
        Ok(table)
    }

    /// Temptation payoff (defector against a cooperator).
    #[must_use]
    pub const fn temptation(&self) -> f64 {
        self.t
    }

    /// Reward payoff (mutual cooperation).
    #[must_use]
    pub const fn reward(&self) -> f64 {
        self.r
    }

    /// Punishment payoff (mutual defection).
    #[must_use]
    pub const fn punishment(&self) -> f64 {
        self.p
    }

    /// Sucker payoff (cooperator against a defector).
    #[must_use]
    pub const fn sucker(&self) -> f64 {
        self.s
    }

    pub(crate) fn check_ordering(&self) -> Result<(), EngineError> {
        if !(self.t.is_finite()
            && self.r.is_finite()
            && self.p.is_finite()
            && self.s.is_finite())
        {
            return Err(EngineError::InvalidConfig("payoffs must be finite"));
        }
        if !(self.t > self.r && self.r > self.p && self.p > self.s) {
            return Err(EngineError::InvalidConfig(
                "payoff ordering must satisfy t > r > p > s",
            ));
        }
        Ok(())
    }

    /// Play one game, returning `(payoff_a, payoff_b)`. Pure and
    /// deterministic.
    #[must_use]
    pub const fn play(&self, a: Strategy, b: Strategy) -> (f64, f64) {
        match (a, b) {
            (Strategy::Defect, Strategy::Defect) => (self.p, self.p),
            (Strategy::Defect, Strategy::Cooperate) => (self.t, self.s),
            (Strategy::Cooperate, Strategy::Defect) => (self.s, self.t),
            (Strategy::Cooperate, Strategy::Cooperate) => (self.r, self.r),
        }
    }
}

/// Moore-neighborhood `(drow, dcol)` deltas in the fixed candidate order
/// shared by strategy and fitness views: right, left, up, down, then the
/// four diagonals. Tie-breaking depends on this order being stable.
pub const NEIGHBOR_OFFSETS: [(isize, isize); 8] = [
    (0, 1),   // right
    (0, -1),  // left
    (-1, 0),  // up
    (1, 0),   // down
    (-1, -1), // north-west
    (-1, 1),  // north-east
    (1, -1),  // south-west
    (1, 1),   // south-east
];

/// Square N x N toroidal grid with row-major storage. Strategy, fitness,
/// and change-code grids all share this container.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Lattice<T> {
    side: usize,
    cells: Vec<T>,
}

impl<T: Copy> Lattice<T> {
    /// Construct a lattice with every cell set to `value`.
    pub fn filled(side: usize, value: T) -> Result<Self, EngineError> {
        if side == 0 {
            return Err(EngineError::InvalidConfig("grid_len must be positive"));
        }
        Ok(Self {
            side,
            cells: vec![value; side * side],
        })
    }

    /// Side length N of the square grid.
    #[must_use]
    pub const fn side(&self) -> usize {
        self.side
    }

    /// Row-major view of all cells.
    #[must_use]
    pub fn cells(&self) -> &[T] {
        &self.cells
    }

    /// Mutable row-major view of all cells.
    #[must_use]
    pub fn cells_mut(&mut self) -> &mut [T] {
        &mut self.cells
    }

    /// Bounds-checked cell access.
    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> Option<&T> {
        if row < self.side && col < self.side {
            Some(&self.cells[row * self.side + col])
        } else {
            None
        }
    }

    /// Direct cell access. Panics if `row` or `col` is out of bounds.
    #[inline]
    #[must_use]
    pub fn at(&self, row: usize, col: usize) -> T {
        self.cells[row * self.side + col]
    }

    /// Overwrite every cell with `value`.
    pub fn fill(&mut self, value: T) {
        self.cells.fill(value);
    }

    /// Toroidally shifted view: cell `(row, col)` of the result holds the
    /// source cell at `(row + drow, col + dcol)` with wraparound, so the
    /// shifted grid gives every cell direct access to one neighbor without
    /// boundary cases. Diagonal views are compositions of two cardinal
    /// shifts.
    #[must_use]
    pub fn shifted(&self, drow: isize, dcol: isize) -> Self {
        let side = self.side;
        let mut cells = Vec::with_capacity(side * side);
        for row in 0..side {
            let src_row = wrap_index(row, drow, side);
            for col in 0..side {
                let src_col = wrap_index(col, dcol, side);
                cells.push(self.cells[src_row * side + src_col]);
            }
        }
        Self { side, cells }
    }

    /// The 8 shifted neighbor views in [`NEIGHBOR_OFFSETS`] order.
    #[must_use]
    pub fn moore_views(&self) -> [Self; 8] {
        NEIGHBOR_OFFSETS.map(|(drow, dcol)| self.shifted(drow, dcol))
    }
}

impl<T: Copy + PartialEq> Lattice<T> {
    /// True when every cell holds the same value (vacuously true only for
    /// the impossible empty grid).
    #[must_use]
    pub fn is_uniform(&self) -> bool {
        match self.cells.first() {
            Some(&first) => self.cells.iter().all(|&cell| cell == first),
            None => true,
        }
    }
}

fn wrap_index(index: usize, delta: isize, side: usize) -> usize {
    (index as isize + delta).rem_euclid(side as isize) as usize
}

/// Grid of per-cell strategies.
pub type StrategyGrid = Lattice<Strategy>;
/// Grid of per-cell fitness scores, recomputed every iteration.
pub type FitnessGrid = Lattice<f64>;
/// Grid of per-cell transition codes for one iteration.
pub type ChangeGrid = Lattice<ChangeCode>;

impl Lattice<Strategy> {
    /// Import a row-major grid of wire values, rejecting any byte outside
    /// {0, 1} with the offending cell's coordinates.
    pub fn from_raw(side: usize, raw: &[u8]) -> Result<Self, EngineError> {
        if side == 0 {
            return Err(EngineError::InvalidConfig("grid_len must be positive"));
        }
        if raw.len() != side * side {
            return Err(EngineError::InvalidConfig(
                "raw cell count must equal grid_len squared",
            ));
        }
        let mut cells = Vec::with_capacity(raw.len());
        for (idx, &value) in raw.iter().enumerate() {
            match Strategy::from_raw(value) {
                Some(strategy) => cells.push(strategy),
                None => {
                    return Err(EngineError::InvalidStrategy {
                        value,
                        row: idx / side,
                        col: idx % side,
                    });
                }
            }
        }
        Ok(Self { side, cells })
    }

    /// Export wire values ({0, 1}) for the rendering collaborator.
    #[must_use]
    pub fn to_raw(&self) -> Vec<u8> {
        self.cells.iter().map(|s| s.as_raw()).collect()
    }
}

impl Lattice<ChangeCode> {
    /// Export wire values ({0, 1, 2, 3}) for the rendering collaborator.
    #[must_use]
    pub fn to_raw(&self) -> Vec<u8> {
        self.cells.iter().map(|c| c.as_raw()).collect()
    }
}

/// Compute the fitness grid for one iteration: every cell's summed payoff
/// from playing the game against its 8 Moore neighbors plus itself
/// (self-play is a deliberate modeling choice, not an omission).
///
/// Derived exclusively from the pre-iteration strategy grid; rows are
/// independent given that frozen snapshot, so they are computed in parallel.
#[must_use]
pub fn fitness_grid(strategies: &StrategyGrid, payoffs: &PayoffTable) -> FitnessGrid {
    let side = strategies.side();
    let views = strategies.moore_views();
    let cells: Vec<f64> = (0..side)
        .into_par_iter()
        .flat_map_iter(|row| {
            let views = &views;
            (0..side).map(move |col| {
                let own = strategies.at(row, col);
                let mut total = payoffs.play(own, own).0;
                for view in views {
                    total += payoffs.play(own, view.at(row, col)).0;
                }
                total
            })
        })
        .collect();
    Lattice { side, cells }
}

/// Frozen decision inputs for one cell: its own strategy and fitness plus
/// its neighbors' in [`NEIGHBOR_OFFSETS`] order, so candidate index `i`
/// always pairs strategy `i` with fitness `i`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellContext {
    pub strategy: Strategy,
    pub fitness: f64,
    pub neighbor_strategies: [Strategy; 8],
    pub neighbor_fitnesses: [f64; 8],
}

/// The strategy-adaptation rule, selected once at configuration time.
/// Both variants share the `(context) -> (next_strategy, change_code)`
/// interface and break fitness ties uniformly at random.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum AdaptationPolicy {
    /// Imitate the best of all 9 candidates (self included as one voting
    /// candidate among 9, re-evaluated even when no neighbor differs).
    #[default]
    BestOfNine,
    /// Imitate the best neighbor only when it strictly beats self; runs
    /// with this policy stop early once the grid is uniform.
    StrictImprovement,
}

impl AdaptationPolicy {
    /// Decide one cell's next strategy and its transition code from the
    /// frozen snapshot. Ties draw from `rng`; the engine calls this in
    /// row-major order so seeded runs are repeatable.
    pub fn decide(
        self,
        ctx: &CellContext,
        rng: &mut dyn RngCore,
    ) -> (Strategy, ChangeCode) {
        let next = match self {
            Self::BestOfNine => Self::best_of_nine(ctx, rng),
            Self::StrictImprovement => Self::strict_improvement(ctx, rng),
        };
        (next, ChangeCode::classify(ctx.strategy, next))
    }

    fn best_of_nine(ctx: &CellContext, rng: &mut dyn RngCore) -> Strategy {
        // Candidate pool: self at index 0, then the 8 neighbors.
        let mut best = ctx.fitness;
        for &fitness in &ctx.neighbor_fitnesses {
            if fitness > best {
                best = fitness;
            }
        }
        let mut tied = [0usize; 9];
        let mut count = 0;
        if ctx.fitness == best {
            tied[count] = 0;
            count += 1;
        }
        for (idx, &fitness) in ctx.neighbor_fitnesses.iter().enumerate() {
            if fitness == best {
                tied[count] = idx + 1;
                count += 1;
            }
        }
        let winner = tied[pick_index(rng, count)];
        if winner == 0 {
            ctx.strategy
        } else {
            ctx.neighbor_strategies[winner - 1]
        }
    }

    fn strict_improvement(ctx: &CellContext, rng: &mut dyn RngCore) -> Strategy {
        // Fast path: a unanimous neighborhood cannot offer a different
        // strategy, so skip the fitness comparison entirely. Must agree
        // with the general path below, which it does trivially because
        // every adoptable strategy equals the cell's own.
        if ctx
            .neighbor_strategies
            .iter()
            .all(|&s| s == ctx.strategy)
        {
            return ctx.strategy;
        }
        let mut best = f64::NEG_INFINITY;
        for &fitness in &ctx.neighbor_fitnesses {
            if fitness > best {
                best = fitness;
            }
        }
        // Self is excluded from the pool but never strictly worse off:
        // matching the best neighbor keeps the current strategy.
        if ctx.fitness >= best {
            return ctx.strategy;
        }
        let mut tied = [0usize; 8];
        let mut count = 0;
        for (idx, &fitness) in ctx.neighbor_fitnesses.iter().enumerate() {
            if fitness == best {
                tied[count] = idx;
                count += 1;
            }
        }
        ctx.neighbor_strategies[tied[pick_index(rng, count)]]
    }
}

fn pick_index(rng: &mut dyn RngCore, count: usize) -> usize {
    if count == 1 {
        0
    } else {
        rng.random_range(0..count)
    }
}

/// Static configuration for one simulation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CoopGridConfig {
    /// Pairwise payoff scalars; must satisfy `t > r > p > s`.
    pub payoffs: PayoffTable,
    /// Side length N of the toroidal grid.
    pub grid_len: usize,
    /// Probability that a cell starts as a cooperator. Consumed (and
    /// validated) only when `special_init` is false.
    pub init_coop: f64,
    /// Iteration budget for [`SimulationEngine::run`].
    pub num_iterations: usize,
    /// Selects seeded single-cell initialization over random initialization.
    pub special_init: bool,
    /// Majority strategy for seeded single-cell initialization; the cell
    /// nearest the grid center gets the opposite one.
    pub seed_majority: Strategy,
    /// Optional RNG seed for reproducible runs; absent means entropy.
    pub rng_seed: Option<u64>,
    /// Which adaptation rule drives strategy updates.
    pub policy: AdaptationPolicy,
}

impl Default for CoopGridConfig {
    fn default() -> Self {
        Self {
            payoffs: PayoffTable::default(),
            grid_len: 100,
            init_coop: 0.5,
            num_iterations: 100,
            special_init: true,
            seed_majority: Strategy::Defect,
            rng_seed: None,
            policy: AdaptationPolicy::BestOfNine,
        }
    }
}

impl CoopGridConfig {
    /// Fail-fast validation, run before any iteration.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.grid_len == 0 {
            return Err(EngineError::InvalidConfig("grid_len must be positive"));
        }
        self.payoffs.check_ordering()?;
        if !self.special_init
            && !(self.init_coop.is_finite() && (0.0..=1.0).contains(&self.init_coop))
        {
            return Err(EngineError::InvalidConfig(
                "init_coop must lie in [0, 1]",
            ));
        }
        Ok(())
    }

    /// Returns the configured RNG seeded exactly once, generating a seed
    /// from entropy if none was supplied (such runs are not reproducible).
    fn seeded_rng(&self) -> SmallRng {
        match self.rng_seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => {
                let seed: u64 = rand::random();
                SmallRng::seed_from_u64(seed)
            }
        }
    }
}

/// One completed iteration: the post-update strategy grid and the per-cell
/// transition codes that produced it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IterationRecord {
    pub strategies: StrategyGrid,
    pub changes: ChangeGrid,
}

/// Where the engine is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineStatus {
    Idle,
    Running,
    Completed,
    ConvergedEarly,
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The iteration budget was exhausted.
    Completed,
    /// The grid collapsed to a uniform strategy before the budget ran out.
    ConvergedEarly,
}

/// Summary returned by [`SimulationEngine::run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunReport {
    pub outcome: RunOutcome,
    /// Number of completed iterations, equal to the history length.
    pub iterations: usize,
}

/// Owns the grid state and drives the iterate-and-record loop.
///
/// Lifecycle: `Idle -> Running -> {Completed, ConvergedEarly}`. The
/// accumulated history is the only state that outlives the run; it is
/// append-only and never truncated.
pub struct SimulationEngine {
    config: CoopGridConfig,
    rng: SmallRng,
    strategies: StrategyGrid,
    last_fitness: Option<FitnessGrid>,
    last_changes: Option<ChangeGrid>,
    status: EngineStatus,
    history: Vec<IterationRecord>,
}

impl fmt::Debug for SimulationEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimulationEngine")
            .field("config", &self.config)
            .field("status", &self.status)
            .field("iterations", &self.history.len())
            .finish()
    }
}

impl SimulationEngine {
    /// Instantiate an engine from the supplied configuration, seeding the
    /// RNG exactly once and building the initial grid.
    pub fn new(config: CoopGridConfig) -> Result<Self, EngineError> {
        config.validate()?;
        let mut rng = config.seeded_rng();
        let strategies = Self::initial_grid(&config, &mut rng)?;
        Ok(Self {
            config,
            rng,
            strategies,
            last_fitness: None,
            last_changes: None,
            status: EngineStatus::Idle,
            history: Vec::new(),
        })
    }

    fn initial_grid(
        config: &CoopGridConfig,
        rng: &mut SmallRng,
    ) -> Result<StrategyGrid, EngineError> {
        if config.special_init {
            // Uniform majority with the single cell nearest the geometric
            // center flipped. Deterministic given N.
            let mut grid = Lattice::filled(config.grid_len, config.seed_majority)?;
            let center = config.grid_len / 2;
            let side = grid.side();
            grid.cells_mut()[center * side + center] = config.seed_majority.opposite();
            Ok(grid)
        } else {
            let mut grid = Lattice::filled(config.grid_len, Strategy::Defect)?;
            // Row-major draw order keeps seeded runs repeatable.
            for cell in grid.cells_mut() {
                if rng.random_bool(config.init_coop) {
                    *cell = Strategy::Cooperate;
                }
            }
            Ok(grid)
        }
    }

    /// Advance one iteration: compute fitness from the frozen grid, let
    /// every cell decide synchronously, append the result to history, then
    /// swap the new grid in.
    pub fn step(&mut self) -> &IterationRecord {
        let fitness = fitness_grid(&self.strategies, &self.config.payoffs);
        let (next, changes) = self.stage_adaptation(&fitness);
        self.strategies = next;
        self.history.push(IterationRecord {
            strategies: self.strategies.clone(),
            changes: changes.clone(),
        });
        self.last_fitness = Some(fitness);
        self.last_changes = Some(changes);
        &self.history[self.history.len() - 1]
    }

    fn stage_adaptation(&mut self, fitness: &FitnessGrid) -> (StrategyGrid, ChangeGrid) {
        let side = self.strategies.side();
        let strategy_views = self.strategies.moore_views();
        let fitness_views = fitness.moore_views();
        let mut next = self.strategies.clone();
        let mut changes = Lattice {
            side,
            cells: vec![ChangeCode::StayDefect; side * side],
        };
        // Row-major traversal is part of the determinism contract: the
        // shared RNG must be drawn from in a fixed cell order.
        for row in 0..side {
            for col in 0..side {
                let ctx = CellContext {
                    strategy: self.strategies.at(row, col),
                    fitness: fitness.at(row, col),
                    neighbor_strategies: std::array::from_fn(|i| {
                        strategy_views[i].at(row, col)
                    }),
                    neighbor_fitnesses: std::array::from_fn(|i| {
                        fitness_views[i].at(row, col)
                    }),
                };
                let (next_strategy, code) =
                    self.config.policy.decide(&ctx, &mut self.rng);
                let idx = row * side + col;
                next.cells_mut()[idx] = next_strategy;
                changes.cells_mut()[idx] = code;
            }
        }
        (next, changes)
    }

    /// Drive the full iterate-and-record loop. Runs to the configured
    /// iteration budget, stopping early under
    /// [`AdaptationPolicy::StrictImprovement`] once the grid reaches a
    /// uniform strategy (a uniform grid is a fixed point of both policies,
    /// so it would stay there for the rest of the budget).
    pub fn run(&mut self) -> RunReport {
        self.status = EngineStatus::Running;
        info!(
            grid_len = self.config.grid_len,
            num_iterations = self.config.num_iterations,
            policy = ?self.config.policy,
            "starting simulation run"
        );
        for iteration in 0..self.config.num_iterations {
            if iteration % 10 == 0 {
                debug!(iteration, "running iteration");
            }
            self.step();
            if self.config.policy == AdaptationPolicy::StrictImprovement
                && self.strategies.is_uniform()
            {
                self.status = EngineStatus::ConvergedEarly;
                info!(
                    iterations = self.history.len(),
                    "grid reached a uniform strategy; stopping early"
                );
                return RunReport {
                    outcome: RunOutcome::ConvergedEarly,
                    iterations: self.history.len(),
                };
            }
        }
        self.status = EngineStatus::Completed;
        info!(iterations = self.history.len(), "simulation run complete");
        RunReport {
            outcome: RunOutcome::Completed,
            iterations: self.history.len(),
        }
    }

    /// Returns an immutable reference to the configuration.
    #[must_use]
    pub fn config(&self) -> &CoopGridConfig {
        &self.config
    }

    /// Current lifecycle status.
    #[must_use]
    pub const fn status(&self) -> EngineStatus {
        self.status
    }

    /// The current strategy grid (initial grid before any iteration).
    #[must_use]
    pub fn current_strategies(&self) -> &StrategyGrid {
        &self.strategies
    }

    /// Fitness grid of the most recent iteration; `None` until the first
    /// iteration has run.
    #[must_use]
    pub fn last_fitness(&self) -> Option<&FitnessGrid> {
        self.last_fitness.as_ref()
    }

    /// Change-code grid of the most recent iteration; `None` until the
    /// first iteration has run (distinguishing "no iteration yet" from
    /// "stayed Defect").
    #[must_use]
    pub fn last_changes(&self) -> Option<&ChangeGrid> {
        self.last_changes.as_ref()
    }

    /// Iterate over the accumulated per-iteration records in order.
    pub fn history(&self) -> impl Iterator<Item = &IterationRecord> {
        self.history.iter()
    }

    /// Number of completed iterations.
    #[must_use]
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Ordered raw strategy frames ({0, 1} per cell) for the rendering
    /// collaborator.
    #[must_use]
    pub fn strategy_frames(&self) -> Vec<Vec<u8>> {
        self.history.iter().map(|r| r.strategies.to_raw()).collect()
    }

    /// Ordered raw change-code frames ({0, 1, 2, 3} per cell) for the
    /// rendering collaborator, equal in length to the strategy frames.
    #[must_use]
    pub fn change_frames(&self) -> Vec<Vec<u8>> {
        self.history.iter().map(|r| r.changes.to_raw()).collect()
    }

    /// Consume the engine, yielding the full run history.
    #[must_use]
    pub fn into_history(self) -> Vec<IterationRecord> {
        self.history
    }
}
