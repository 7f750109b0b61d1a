use crate::api::NetBoxClient;
use crate::wire::{
    cable_filter, port_endpoint, CableRecord, DeviceRecord, PortRecord, TerminationRecord,
};
use async_trait::async_trait;
use netbox_topology::{
    CableDetail, CableSide, ConnectionFetcher, DeviceProfile, Link, Node, PortKind, Result,
    Termination, TraceError,
};

/// [`ConnectionFetcher`] backed by the NetBox REST API.
pub struct NetBoxFetcher {
    client: NetBoxClient,
}

impl NetBoxFetcher {
    pub fn new(client: NetBoxClient) -> Self {
        Self { client }
    }

    async fn cabled_ports(&self, device_id: u64, kind: PortKind) -> Result<Vec<Node>> {
        let records: Vec<PortRecord> = self
            .client
            .list_all(
                port_endpoint(kind),
                &[
                    ("device_id", device_id.to_string()),
                    ("cabled", "true".to_string()),
                ],
            )
            .await?;
        Ok(records.into_iter().map(|r| r.into_node(kind)).collect())
    }

    async fn named_port(&self, device_id: u64, name: &str, kind: PortKind) -> Result<Option<Node>> {
        let records: Vec<PortRecord> = self
            .client
            .list_all(
                port_endpoint(kind),
                &[("device_id", device_id.to_string()), ("name", name.to_string())],
            )
            .await?;
        Ok(records.into_iter().next().map(|r| r.into_node(kind)))
    }

    async fn termination(
        &self,
        record: &TerminationRecord,
        side: CableSide,
    ) -> Result<Option<Termination>> {
        let Some(node) = record.to_node() else {
            log::debug!(
                "skipping {} termination {} on cable",
                record.object_type,
                record.object_id
            );
            return Ok(None);
        };
        let counterparts = self.counterparts(&node).await?;
        let names = counterparts.into_iter().map(|n| n.interface_name);
        let (rear_port, front_ports) = match node.port_kind {
            PortKind::Regular => (None, Vec::new()),
            PortKind::FrontPort => (names.into_iter().next(), Vec::new()),
            PortKind::RearPort => (None, names.collect()),
        };
        Ok(Some(Termination {
            side,
            port_kind: node.port_kind,
            device: node.device_name,
            port: node.interface_name,
            rear_port,
            front_ports,
        }))
    }
}

#[async_trait]
impl ConnectionFetcher for NetBoxFetcher {
    async fn device(&self, name: &str) -> Result<DeviceProfile> {
        let records: Vec<DeviceRecord> = self
            .client
            .list_all("/api/dcim/devices/", &[("name", name.to_string())])
            .await?;
        records
            .into_iter()
            .next()
            .map(DeviceRecord::into_profile)
            .ok_or_else(|| TraceError::not_found("Device", name))
    }

    async fn device_by_id(&self, id: u64) -> Result<DeviceProfile> {
        let record: DeviceRecord = self
            .client
            .get(&format!("/api/dcim/devices/{id}/"), &[])
            .await
            .map_err(|e| {
                if e.is_not_found() {
                    TraceError::not_found("Device", id.to_string())
                } else {
                    e.into()
                }
            })?;
        Ok(record.into_profile())
    }

    async fn device_ports(&self, device_id: u64) -> Result<Vec<Node>> {
        let (mut interfaces, front, rear) = tokio::try_join!(
            self.cabled_ports(device_id, PortKind::Regular),
            self.cabled_ports(device_id, PortKind::FrontPort),
            self.cabled_ports(device_id, PortKind::RearPort),
        )?;
        interfaces.extend(front);
        interfaces.extend(rear);
        Ok(interfaces)
    }

    async fn port(&self, device: &str, name: &str) -> Result<Node> {
        let profile = self.device(device).await?;
        for kind in [PortKind::Regular, PortKind::FrontPort, PortKind::RearPort] {
            if let Some(node) = self.named_port(profile.id, name, kind).await? {
                return Ok(node);
            }
        }
        Err(TraceError::not_found("Port", format!("{device}:{name}")))
    }

    async fn neighbors(&self, node: &Node) -> Result<Vec<Link>> {
        let cables: Vec<CableRecord> = self
            .client
            .list_all(
                "/api/dcim/cables/",
                &[(cable_filter(node.port_kind), node.interface_id.to_string())],
            )
            .await?;

        let mut links = Vec::new();
        for cable in &cables {
            let edge = cable.edge();
            for peer in cable.peers_of(node) {
                match peer.to_node() {
                    Some(peer) => links.push(Link {
                        edge: edge.clone(),
                        peer,
                    }),
                    None => log::debug!(
                        "cable {} ends on unsupported {} {}",
                        cable.id,
                        peer.object_type,
                        peer.object_id
                    ),
                }
            }
        }
        Ok(links)
    }

    async fn counterparts(&self, node: &Node) -> Result<Vec<Node>> {
        match node.port_kind {
            PortKind::Regular => Ok(Vec::new()),
            PortKind::FrontPort => {
                let record: PortRecord = self
                    .client
                    .get(&format!("/api/dcim/front-ports/{}/", node.interface_id), &[])
                    .await?;
                Ok(record
                    .rear_port
                    .map(|rear| Node {
                        device_id: node.device_id,
                        device_name: node.device_name.clone(),
                        interface_id: rear.id,
                        interface_name: rear.name.unwrap_or_else(|| format!("port-{}", rear.id)),
                        port_kind: PortKind::RearPort,
                    })
                    .into_iter()
                    .collect())
            }
            PortKind::RearPort => {
                let records: Vec<PortRecord> = self
                    .client
                    .list_all(
                        port_endpoint(PortKind::FrontPort),
                        &[("rear_port_id", node.interface_id.to_string())],
                    )
                    .await?;
                Ok(records
                    .into_iter()
                    .map(|r| r.into_node(PortKind::FrontPort))
                    .collect())
            }
        }
    }

    async fn cable(&self, cable_id: u64) -> Result<CableDetail> {
        let cable: CableRecord = self
            .client
            .get(&format!("/api/dcim/cables/{cable_id}/"), &[])
            .await
            .map_err(|e| {
                if e.is_not_found() {
                    TraceError::not_found("Cable", cable_id.to_string())
                } else {
                    e.into()
                }
            })?;

        let mut terminations = Vec::new();
        for (side, records) in [
            (CableSide::A, &cable.a_terminations),
            (CableSide::B, &cable.b_terminations),
        ] {
            for record in records {
                if let Some(termination) = self.termination(record, side).await? {
                    terminations.push(termination);
                }
            }
        }

        Ok(CableDetail {
            cable_id,
            cable_type: cable.cable_type(),
            status: cable.status(),
            length: cable.length,
            length_unit: cable.length_unit.as_ref().map(|u| u.value.clone()),
            terminations,
        })
    }
}
