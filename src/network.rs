//! The assembled parameters of a capacity-expansion model.
//!
//! A [`ModelParameterSet`] is built once by [`assemble`] and never modified afterwards; a new
//! scenario means building a new parameter set.
use crate::cost::TechnologyID;
use crate::error::PipelineError;
use crate::id::define_id_type;
use crate::time_series::Snapshots;
use crate::units::{
    Capacity, Dimensionless, Emissions, EmissionsPerEnergy, Energy, Hours, MoneyPerCapacity,
    MoneyPerEnergy,
};
use indexmap::IndexMap;
use serde_string_enum::DeserializeLabeledStringEnum;

pub mod assemble;
pub use assemble::{
    AssemblyConfig, BusConfig, EmissionsCapConfig, LineConfig, TechnologyConfig, assemble,
};

define_id_type! {BusID}
define_id_type! {ComponentID}

/// Whether a technology's output can be controlled or depends on the weather
#[derive(PartialEq, Eq, Debug, Clone, Copy, DeserializeLabeledStringEnum)]
pub enum TechnologyKind {
    /// Output can be set anywhere between zero and nominal capacity
    #[string = "dispatchable"]
    Dispatchable,
    /// Output is limited by a capacity-factor profile
    #[string = "variable"]
    Variable,
    /// Stores and releases electricity
    #[string = "storage"]
    Storage,
}

/// Bounds on the capacity of a component
#[derive(PartialEq, Debug, Clone, Copy)]
pub enum CapacityBound {
    /// Capacity is an input
    Fixed(Capacity),
    /// Capacity is chosen by the optimisation
    Extendable {
        /// Minimum capacity to build
        min: Capacity,
        /// Maximum capacity to build, if limited
        max: Option<Capacity>,
    },
}

impl CapacityBound {
    /// Whether the capacity is chosen by the optimisation
    pub fn is_extendable(&self) -> bool {
        matches!(self, Self::Extendable { .. })
    }

    /// The lowest permitted capacity
    pub fn min(&self) -> Capacity {
        match self {
            Self::Fixed(capacity) => *capacity,
            Self::Extendable { min, .. } => *min,
        }
    }

    /// The highest permitted capacity, if any
    pub fn max(&self) -> Option<Capacity> {
        match self {
            Self::Fixed(capacity) => Some(*capacity),
            Self::Extendable { max, .. } => *max,
        }
    }
}

/// Per-snapshot parameters for a bus
#[derive(PartialEq, Debug, Clone)]
pub struct BusParams {
    /// Demand to be met in each snapshot
    pub demand: Vec<Capacity>,
}

/// Parameters for a generator
#[derive(PartialEq, Debug, Clone)]
pub struct GeneratorParams {
    /// The technology the generator is built from
    pub technology: TechnologyID,
    /// The bus the generator is connected to
    pub bus: BusID,
    /// Either dispatchable or variable
    pub kind: TechnologyKind,
    /// Nominal capacity bounds. Output is always bounded below by zero.
    pub capacity: CapacityBound,
    /// Per-snapshot availability as a fraction of nominal capacity (variable generators only)
    pub availability: Option<Vec<Dimensionless>>,
    /// Cost per MWh of output
    pub marginal_cost: MoneyPerEnergy,
    /// Annualised cost per MW of capacity
    pub capital_cost: MoneyPerCapacity,
    /// Emissions per MWh of output
    pub emission_factor: EmissionsPerEnergy,
}

impl GeneratorParams {
    /// Available fraction of nominal capacity in the given snapshot.
    ///
    /// # Panics
    ///
    /// If `snapshot` is beyond the end of the availability profile. Parameter sets which pass
    /// [`ModelParameterSet::check_consistent`] have a value for every snapshot.
    pub fn max_per_unit(&self, snapshot: usize) -> Dimensionless {
        self.availability
            .as_ref()
            .map_or(Dimensionless(1.0), |availability| availability[snapshot])
    }

    /// The upper bound on output in each snapshot for the given nominal capacity
    pub fn upper_bound_series(&self, capacity: Capacity, snapshots: &Snapshots) -> Vec<Capacity> {
        (0..snapshots.len())
            .map(|snapshot| self.max_per_unit(snapshot) * capacity)
            .collect()
    }
}

/// Parameters for a storage unit
#[derive(PartialEq, Debug, Clone)]
pub struct StorageParams {
    /// The technology the storage unit is built from
    pub technology: TechnologyID,
    /// The bus the storage unit is connected to
    pub bus: BusID,
    /// Bounds on charge and discharge power
    pub capacity: CapacityBound,
    /// Energy capacity per unit power capacity
    pub max_hours: Hours,
    /// Fraction of charged energy which is stored
    pub efficiency_store: Dimensionless,
    /// Fraction of stored energy which is delivered on discharge
    pub efficiency_dispatch: Dimensionless,
    /// Whether the state of charge must return to its initial value at the end of the horizon
    pub cyclic_state_of_charge: bool,
    /// Cost per MWh discharged
    pub marginal_cost: MoneyPerEnergy,
    /// Annualised cost per MW of power capacity, including the energy capacity
    pub capital_cost: MoneyPerCapacity,
}

impl StorageParams {
    /// The energy capacity for the given power capacity
    pub fn energy_capacity(&self, power: Capacity) -> Energy {
        power * self.max_hours
    }

    /// Overall fraction of charged energy which is eventually delivered
    pub fn round_trip_efficiency(&self) -> Dimensionless {
        self.efficiency_store * self.efficiency_dispatch
    }
}

/// Parameters for a transmission line.
///
/// Lines are modelled as simple transport links: flow in either direction is bounded by the
/// line's rating.
#[derive(PartialEq, Debug, Clone)]
pub struct LineParams {
    /// One end of the line
    pub bus0: BusID,
    /// The other end of the line
    pub bus1: BusID,
    /// Bounds on the rating
    pub capacity: CapacityBound,
    /// Annualised cost per MW of rating
    pub capital_cost: MoneyPerCapacity,
}

/// The quantity limited by a global constraint
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum GlobalConstraintKind {
    /// Total emissions over the horizon
    Emissions,
}

/// A named upper limit on a quantity summed over all components and snapshots
#[derive(PartialEq, Debug, Clone)]
pub struct GlobalConstraint {
    /// The constraint's name
    pub name: String,
    /// What is being limited
    pub kind: GlobalConstraintKind,
    /// The limit
    pub limit: Emissions,
}

/// Per-snapshot output of each generator
pub type Dispatch = IndexMap<ComponentID, Vec<Capacity>>;

/// All the parameters needed to build a capacity-expansion model
#[derive(PartialEq, Debug, Clone)]
pub struct ModelParameterSet {
    /// The model's time index
    pub snapshots: Snapshots,
    /// Buses and their demand
    pub buses: IndexMap<BusID, BusParams>,
    /// Generators
    pub generators: IndexMap<ComponentID, GeneratorParams>,
    /// Storage units
    pub storage_units: IndexMap<ComponentID, StorageParams>,
    /// Transmission lines
    pub lines: IndexMap<ComponentID, LineParams>,
    /// Global constraints
    pub global_constraints: Vec<GlobalConstraint>,
}

impl ModelParameterSet {
    /// Check that every per-snapshot series has one value for each snapshot.
    ///
    /// [`assemble`] only produces consistent parameter sets, but ones built by hand may not be.
    pub fn check_consistent(&self) -> Result<(), PipelineError> {
        let expected = self.snapshots.len();
        let check = |name: &str, len: usize| {
            if len == expected {
                Ok(())
            } else {
                Err(PipelineError::ProfileLengthMismatch {
                    profile: name.to_string(),
                    message: format!("expected {expected} values, found {len}"),
                })
            }
        };

        for (id, bus) in &self.buses {
            check(&format!("demand for bus {id}"), bus.demand.len())?;
        }
        for (id, generator) in &self.generators {
            if let Some(availability) = &generator.availability {
                check(&format!("availability for {id}"), availability.len())?;
            }
        }

        Ok(())
    }

    /// Total emissions for the given generator dispatch.
    ///
    /// This is the quantity limited by emissions constraints: output in each snapshot multiplied
    /// by the generator's emission factor and the snapshot weight. Generators missing from
    /// `dispatch` are assumed to produce nothing.
    pub fn total_emissions(&self, dispatch: &Dispatch) -> Emissions {
        let weight = self.snapshots.weight();
        self.generators
            .iter()
            .filter_map(|(id, generator)| {
                dispatch.get(id).map(|output| (generator.emission_factor, output))
            })
            .flat_map(|(factor, output)| {
                output
                    .iter()
                    .map(move |&power| factor * (power * weight))
            })
            .sum()
    }

    /// Total demand over the horizon
    pub fn total_demand(&self) -> Energy {
        let weight = self.snapshots.weight();
        self.buses
            .values()
            .flat_map(|bus| bus.demand.iter().map(move |&demand| demand * weight))
            .sum()
    }
}
