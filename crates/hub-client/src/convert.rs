use tracing::warn;

use hub_model::{GpuCount, NetworkType, PropertySet, Resources, Slot, TaskId, WorkerId};

use crate::proto;

impl From<&WorkerId> for proto::Id {
    fn from(id: &WorkerId) -> Self {
        proto::Id {
            id: id.to_string(),
        }
    }
}

impl From<&TaskId> for proto::Id {
    fn from(id: &TaskId) -> Self {
        proto::Id {
            id: id.to_string(),
        }
    }
}

impl From<&str> for proto::Id {
    fn from(id: &str) -> Self {
        proto::Id { id: id.to_string() }
    }
}

impl From<GpuCount> for proto::GpuCount {
    fn from(count: GpuCount) -> Self {
        match count {
            GpuCount::None => proto::GpuCount::NoGpu,
            GpuCount::Single => proto::GpuCount::SingleGpu,
            GpuCount::Multiple => proto::GpuCount::MultipleGpu,
        }
    }
}

impl From<proto::GpuCount> for GpuCount {
    fn from(count: proto::GpuCount) -> Self {
        match count {
            proto::GpuCount::NoGpu => GpuCount::None,
            proto::GpuCount::SingleGpu => GpuCount::Single,
            proto::GpuCount::MultipleGpu => GpuCount::Multiple,
        }
    }
}

impl From<NetworkType> for proto::NetworkType {
    fn from(network: NetworkType) -> Self {
        match network {
            NetworkType::None => proto::NetworkType::NoNetwork,
            NetworkType::Outbound => proto::NetworkType::Outbound,
            NetworkType::Incoming => proto::NetworkType::Incoming,
        }
    }
}

impl From<proto::NetworkType> for NetworkType {
    fn from(network: proto::NetworkType) -> Self {
        match network {
            proto::NetworkType::NoNetwork => NetworkType::None,
            proto::NetworkType::Outbound => NetworkType::Outbound,
            proto::NetworkType::Incoming => NetworkType::Incoming,
        }
    }
}

impl From<&Resources> for proto::Resources {
    fn from(res: &Resources) -> Self {
        proto::Resources {
            cpu_cores: res.cpu_cores,
            memory_bytes: res.memory_bytes,
            gpu_count: proto::GpuCount::from(res.gpu_count) as i32,
            storage_bytes: res.storage_bytes,
            network_type: proto::NetworkType::from(res.network) as i32,
            net_traffic_in: res.net_in_bytes,
            net_traffic_out: res.net_out_bytes,
            properties: res.properties.as_map().clone(),
        }
    }
}

/// Wire form of a slot. Field-for-field, nothing is validated.
impl From<&Slot> for proto::Slot {
    fn from(slot: &Slot) -> Self {
        proto::Slot {
            duration: slot.duration_secs,
            price: slot.price.clone(),
            resources: Some(proto::Resources::from(&slot.resources)),
        }
    }
}

impl From<Slot> for proto::Slot {
    fn from(slot: Slot) -> Self {
        proto::Slot::from(&slot)
    }
}

impl From<proto::Resources> for Resources {
    fn from(res: proto::Resources) -> Self {
        let gpu_count = proto::GpuCount::try_from(res.gpu_count).unwrap_or_else(|_| {
            warn!(value = res.gpu_count, "unknown gpu count from hub, assuming none");
            proto::GpuCount::NoGpu
        });
        let network = proto::NetworkType::try_from(res.network_type).unwrap_or_else(|_| {
            warn!(value = res.network_type, "unknown network type from hub, assuming none");
            proto::NetworkType::NoNetwork
        });

        Resources {
            cpu_cores: res.cpu_cores,
            memory_bytes: res.memory_bytes,
            gpu_count: gpu_count.into(),
            storage_bytes: res.storage_bytes,
            network: network.into(),
            net_in_bytes: res.net_traffic_in,
            net_out_bytes: res.net_traffic_out,
            properties: PropertySet::from(res.properties),
        }
    }
}

impl From<proto::Slot> for Slot {
    fn from(slot: proto::Slot) -> Self {
        Slot {
            duration_secs: slot.duration,
            price: slot.price,
            resources: slot.resources.map(Resources::from).unwrap_or_default(),
        }
    }
}
