//! In-memory `CloudClient` implementation

use async_trait::async_trait;
use stackform_cloud::{
    CloudClient, CloudError, Direction, Filter, ResourceHandle, ResourceKind, ResourceState,
    Result, RuleSpec,
};
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

/// One journaled API call
#[derive(Debug, Clone)]
pub struct Call {
    pub op: &'static str,
    pub kind: Option<ResourceKind>,
    pub target: String,
}

const MUTATING_OPS: &[&str] = &[
    "create",
    "update",
    "delete",
    "tag",
    "attach",
    "detach",
    "add_rule",
    "remove_rule",
    "add_route",
    "remove_route",
];

#[derive(Debug)]
struct Record {
    handle: ResourceHandle,
    tags: HashMap<String, String>,
    params: serde_json::Value,
    pending_remaining: u32,
    invisible_remaining: u32,
    /// Provider-managed child (default SG, main route table); skipped by
    /// reference checks and cascade-deleted with its VPC.
    auto: bool,
    /// Remaining drain ticks for a scaling group told to go to zero.
    draining: Option<u32>,
}

#[derive(Debug, Default)]
struct Faults {
    fail_create: HashSet<ResourceKind>,
    stuck_pending: HashSet<ResourceKind>,
    undeletable: HashSet<ResourceKind>,
}

struct Inner {
    records: HashMap<String, Record>,
    rules: HashMap<String, Vec<RuleSpec>>,
    routes: HashMap<String, Vec<(String, String)>>,
    /// child id -> target id (internet gateway -> vpc)
    attachments: HashMap<String, String>,
    journal: Vec<Call>,
    seq: u64,
    pending_ticks: u32,
    visibility_lag: u32,
    drain_ticks: u32,
    faults: Faults,
}

/// Deterministic in-memory cloud provider
pub struct MemoryCloud {
    inner: Mutex<Inner>,
}

impl Default for MemoryCloud {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryCloud {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                records: HashMap::new(),
                rules: HashMap::new(),
                routes: HashMap::new(),
                attachments: HashMap::new(),
                journal: Vec::new(),
                seq: 0,
                pending_ticks: 1,
                visibility_lag: 0,
                drain_ticks: 1,
                faults: Faults::default(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().expect("memory cloud state poisoned")
    }

    /// How many fetches a new resource spends in `pending`.
    pub fn set_pending_ticks(&self, ticks: u32) {
        self.lock().pending_ticks = ticks;
    }

    /// How many fetches a new resource stays invisible to lookups.
    pub fn set_visibility_lag(&self, fetches: u32) {
        self.lock().visibility_lag = fetches;
    }

    /// How many delete/fetch attempts a draining scaling group needs
    /// before its instances are gone.
    pub fn set_drain_ticks(&self, ticks: u32) {
        self.lock().drain_ticks = ticks;
    }

    /// Every create of this kind fails permanently.
    pub fn inject_create_failure(&self, kind: ResourceKind) {
        self.lock().faults.fail_create.insert(kind);
    }

    /// Resources of this kind never leave `pending`.
    pub fn inject_stuck_pending(&self, kind: ResourceKind) {
        self.lock().faults.stuck_pending.insert(kind);
    }

    /// Every delete of this kind fails with `DependencyViolation`.
    pub fn inject_undeletable(&self, kind: ResourceKind) {
        self.lock().faults.undeletable.insert(kind);
    }

    // ---- journal inspection ----

    pub fn journal(&self) -> Vec<Call> {
        self.lock().journal.clone()
    }

    pub fn clear_journal(&self) {
        self.lock().journal.clear();
    }

    /// Count of journaled calls with the given op name.
    pub fn calls(&self, op: &str) -> usize {
        self.lock().journal.iter().filter(|c| c.op == op).count()
    }

    pub fn creates_of(&self, kind: ResourceKind) -> usize {
        self.lock()
            .journal
            .iter()
            .filter(|c| c.op == "create" && c.kind == Some(kind))
            .count()
    }

    /// Count of all mutating calls (create/update/delete/tag/attach/
    /// detach/rule/route ops).
    pub fn mutation_count(&self) -> usize {
        self.lock()
            .journal
            .iter()
            .filter(|c| MUTATING_OPS.contains(&c.op))
            .count()
    }

    /// Ids passed to `delete` for the given kind, in call order.
    pub fn delete_targets(&self, kind: ResourceKind) -> Vec<String> {
        self.lock()
            .journal
            .iter()
            .filter(|c| c.op == "delete" && c.kind == Some(kind))
            .map(|c| c.target.clone())
            .collect()
    }

    pub fn gets_of(&self, kind: ResourceKind, id: &str) -> usize {
        self.lock()
            .journal
            .iter()
            .filter(|c| c.op == "get" && c.kind == Some(kind) && c.target == id)
            .count()
    }

    // ---- state inspection (not journaled) ----

    pub fn contains(&self, id: &str) -> bool {
        self.lock().records.contains_key(id)
    }

    pub fn ids_of(&self, kind: ResourceKind) -> Vec<String> {
        let mut ids: Vec<String> = self
            .lock()
            .records
            .values()
            .filter(|r| r.handle.kind == kind)
            .map(|r| r.handle.id.clone())
            .collect();
        ids.sort();
        ids
    }

    pub fn live_rules(&self, group_id: &str, direction: Direction) -> Vec<RuleSpec> {
        self.lock()
            .rules
            .get(group_id)
            .map(|rules| {
                rules
                    .iter()
                    .filter(|r| r.direction == direction)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn routes_of(&self, table_id: &str) -> Vec<(String, String)> {
        self.lock()
            .routes
            .get(table_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Id of the provider-managed default security group of a VPC.
    pub fn default_security_group(&self, vpc_id: &str) -> Option<String> {
        self.lock()
            .records
            .values()
            .find(|r| {
                r.auto
                    && r.handle.kind == ResourceKind::SecurityGroup
                    && r.params.get("vpc_id").and_then(|v| v.as_str()) == Some(vpc_id)
            })
            .map(|r| r.handle.id.clone())
    }
}

fn mint_id(inner: &mut Inner, kind: ResourceKind) -> String {
    inner.seq += 1;
    format!("{}-{:04x}", kind.id_prefix(), inner.seq)
}

fn insert_record(inner: &mut Inner, mut record: Record) {
    if record.handle.kind == ResourceKind::SecurityGroup {
        // Real providers seed new groups with a permissive default egress
        // rule; egress reconciliation must cope with it.
        inner.rules.insert(
            record.handle.id.clone(),
            vec![RuleSpec::egress("all", 0, 0, "0.0.0.0/0")],
        );
    }
    if record.handle.kind == ResourceKind::RouteTable {
        inner.routes.insert(record.handle.id.clone(), Vec::new());
    }
    for (key, value) in &record.tags {
        if key == "Name" {
            record
                .handle
                .attributes
                .insert("name".into(), serde_json::json!(value));
        }
    }
    inner.records.insert(record.handle.id.clone(), record);
}

fn new_record(
    inner: &mut Inner,
    kind: ResourceKind,
    params: serde_json::Value,
    auto: bool,
) -> ResourceHandle {
    let id = mint_id(inner, kind);
    let pending = if auto { 0 } else { inner.pending_ticks };
    let state = if pending > 0 {
        ResourceState::Pending
    } else {
        ResourceState::Available
    };

    let mut handle = ResourceHandle::new(&id, kind).with_state(state);
    if let Some(object) = params.as_object() {
        for (key, value) in object {
            handle.attributes.insert(key.clone(), value.clone());
        }
    }
    if kind == ResourceKind::AutoScalingGroup {
        let instances = params.get("min_size").and_then(|v| v.as_u64()).unwrap_or(0);
        handle
            .attributes
            .insert("instances".into(), serde_json::json!(instances));
    }
    if kind == ResourceKind::AccessKey {
        handle.attributes.insert(
            "secret_access_key".into(),
            serde_json::json!(format!("sk-{:08x}", inner.seq)),
        );
    }

    insert_record(
        inner,
        Record {
            handle: handle.clone(),
            tags: HashMap::new(),
            params,
            pending_remaining: pending,
            invisible_remaining: if auto { 0 } else { inner.visibility_lag },
            auto,
            draining: None,
        },
    );
    handle
}

/// Provider-managed children created alongside every VPC.
fn seed_vpc_children(inner: &mut Inner, vpc_id: &str) {
    let sg = new_record(
        inner,
        ResourceKind::SecurityGroup,
        serde_json::json!({ "vpc_id": vpc_id, "description": "default VPC security group" }),
        true,
    );
    if let Some(record) = inner.records.get_mut(&sg.id) {
        record.tags.insert("Name".into(), "default".into());
        record
            .handle
            .attributes
            .insert("name".into(), serde_json::json!("default"));
    }

    new_record(
        inner,
        ResourceKind::RouteTable,
        serde_json::json!({ "vpc_id": vpc_id, "main": "true" }),
        true,
    );
}

fn matches_filters(record: &Record, filters: &[Filter]) -> bool {
    filters.iter().all(|filter| {
        if let Some(tag_key) = filter.key.strip_prefix("tag:") {
            record.tags.get(tag_key).map(String::as_str) == Some(filter.value.as_str())
        } else {
            record.params.get(&filter.key).and_then(|v| v.as_str()) == Some(filter.value.as_str())
        }
    })
}

/// Is anything still referencing `id`? Returns the referencing id.
fn referenced_by(inner: &Inner, target: &Record) -> Option<String> {
    let id = target.handle.id.as_str();

    for record in inner.records.values() {
        if record.auto || record.handle.id == id {
            continue;
        }
        let params = &record.params;
        let scalar_refs = [
            "vpc_id",
            "subnet_id",
            "security_group_id",
            "launch_config_id",
            "load_balancer_id",
        ];
        if scalar_refs
            .iter()
            .any(|key| params.get(*key).and_then(|v| v.as_str()) == Some(id))
        {
            return Some(record.handle.id.clone());
        }
        if let Some(groups) = params.get("security_group_ids").and_then(|v| v.as_array())
            && groups.iter().any(|v| v.as_str() == Some(id))
        {
            return Some(record.handle.id.clone());
        }
    }

    // An attached gateway pins its VPC; an attachment pins the gateway.
    if inner.attachments.contains_key(id) {
        return Some(format!("attachment of {id}"));
    }
    if let Some((child, _)) = inner.attachments.iter().find(|(_, t)| t.as_str() == id) {
        return Some(child.clone());
    }

    // IAM users are pinned by their inline policies and access keys.
    if target.handle.kind == ResourceKind::IamUser
        && let Some(user_name) = target.params.get("user_name").and_then(|v| v.as_str())
    {
        for record in inner.records.values() {
            if matches!(
                record.handle.kind,
                ResourceKind::IamPolicy | ResourceKind::AccessKey
            ) && record.params.get("user_name").and_then(|v| v.as_str()) == Some(user_name)
            {
                return Some(record.handle.id.clone());
            }
        }
    }

    None
}

fn tick_visibility(record: &mut Record) -> bool {
    if record.invisible_remaining > 0 {
        record.invisible_remaining -= 1;
        return false;
    }
    true
}

fn tick_lifecycle(record: &mut Record, faults: &Faults) {
    if record.handle.state == ResourceState::Pending
        && !faults.stuck_pending.contains(&record.handle.kind)
    {
        if record.pending_remaining > 0 {
            record.pending_remaining -= 1;
        }
        if record.pending_remaining == 0 {
            record.handle.state = ResourceState::Available;
        }
    }

    if let Some(remaining) = record.draining {
        if remaining > 0 {
            record.draining = Some(remaining - 1);
        } else {
            record.draining = None;
            record
                .handle
                .attributes
                .insert("instances".into(), serde_json::json!(0));
        }
    }
}

fn instance_count(record: &Record) -> u64 {
    record
        .handle
        .attributes
        .get("instances")
        .and_then(|v| v.as_u64())
        .unwrap_or(0)
}

fn remove_record(inner: &mut Inner, id: &str) {
    inner.records.remove(id);
    inner.rules.remove(id);
    inner.routes.remove(id);
    inner.attachments.remove(id);
}

#[async_trait]
impl CloudClient for MemoryCloud {
    async fn find(&self, kind: ResourceKind, filters: &[Filter]) -> Result<Vec<ResourceHandle>> {
        let mut inner = self.lock();
        inner.journal.push(Call {
            op: "find",
            kind: Some(kind),
            target: filters
                .iter()
                .map(|f| format!("{}={}", f.key, f.value))
                .collect::<Vec<_>>()
                .join(","),
        });

        let mut found: Vec<ResourceHandle> = inner
            .records
            .values()
            .filter(|r| {
                r.handle.kind == kind && r.invisible_remaining == 0 && matches_filters(r, filters)
            })
            .map(|r| r.handle.clone())
            .collect();
        found.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(found)
    }

    async fn get(&self, kind: ResourceKind, id: &str) -> Result<ResourceHandle> {
        let mut inner = self.lock();
        inner.journal.push(Call {
            op: "get",
            kind: Some(kind),
            target: id.to_string(),
        });

        // split borrow: faults are read-only while the record mutates
        let Inner {
            records, faults, ..
        } = &mut *inner;
        let record = records
            .get_mut(id)
            .filter(|r| r.handle.kind == kind)
            .ok_or_else(|| CloudError::NotFound(format!("{kind} {id}")))?;

        if !tick_visibility(record) {
            return Err(CloudError::NotFound(format!("{kind} {id}")));
        }
        tick_lifecycle(record, faults);
        Ok(record.handle.clone())
    }

    async fn create(
        &self,
        kind: ResourceKind,
        params: serde_json::Value,
    ) -> Result<ResourceHandle> {
        let mut inner = self.lock();
        inner.journal.push(Call {
            op: "create",
            kind: Some(kind),
            target: params
                .get("name")
                .or_else(|| params.get("user_name"))
                .and_then(|v| v.as_str())
                .unwrap_or("")
                .to_string(),
        });

        if inner.faults.fail_create.contains(&kind) {
            return Err(CloudError::Permanent(format!(
                "injected create failure for {kind}"
            )));
        }

        // Inline policies are an upsert keyed by (user, policy name).
        if kind == ResourceKind::IamPolicy {
            let user = params.get("user_name").and_then(|v| v.as_str());
            let name = params.get("policy_name").and_then(|v| v.as_str());
            if let Some(existing) = inner.records.values_mut().find(|r| {
                r.handle.kind == ResourceKind::IamPolicy
                    && r.params.get("user_name").and_then(|v| v.as_str()) == user
                    && r.params.get("policy_name").and_then(|v| v.as_str()) == name
            }) {
                existing.params = params;
                return Ok(existing.handle.clone());
            }
        }

        let handle = new_record(&mut inner, kind, params, false);
        if kind == ResourceKind::Vpc {
            let vpc_id = handle.id.clone();
            seed_vpc_children(&mut inner, &vpc_id);
        }
        Ok(handle)
    }

    async fn update(&self, kind: ResourceKind, id: &str, params: serde_json::Value) -> Result<()> {
        let mut inner = self.lock();
        inner.journal.push(Call {
            op: "update",
            kind: Some(kind),
            target: id.to_string(),
        });

        let drain_ticks = inner.drain_ticks;
        let record = inner
            .records
            .get_mut(id)
            .filter(|r| r.handle.kind == kind)
            .ok_or_else(|| CloudError::NotFound(format!("{kind} {id}")))?;

        if let (Some(new_params), Some(existing)) = (params.as_object(), record.params.as_object())
        {
            let mut merged = existing.clone();
            for (key, value) in new_params {
                merged.insert(key.clone(), value.clone());
                record
                    .handle
                    .attributes
                    .insert(key.clone(), value.clone());
            }
            record.params = serde_json::Value::Object(merged);
        }

        if kind == ResourceKind::AutoScalingGroup
            && params.get("desired_capacity").and_then(|v| v.as_u64()) == Some(0)
            && instance_count(record) > 0
        {
            record.draining = Some(drain_ticks);
        }
        Ok(())
    }

    async fn delete(&self, kind: ResourceKind, id: &str) -> Result<()> {
        let mut inner = self.lock();
        inner.journal.push(Call {
            op: "delete",
            kind: Some(kind),
            target: id.to_string(),
        });

        if !inner.records.contains_key(id) {
            return Err(CloudError::NotFound(format!("{kind} {id}")));
        }
        if inner.faults.undeletable.contains(&kind) {
            return Err(CloudError::DependencyViolation(format!(
                "injected dependency violation for {kind} {id}"
            )));
        }

        {
            let Inner {
                records, faults, ..
            } = &mut *inner;
            let record = records.get_mut(id).expect("checked above");

            if record.handle.kind == ResourceKind::SecurityGroup
                && record.tags.get("Name").map(String::as_str) == Some("default")
            {
                return Err(CloudError::Permanent(format!(
                    "security group {id} is the VPC default and cannot be deleted"
                )));
            }

            if record.handle.kind == ResourceKind::AutoScalingGroup {
                tick_lifecycle(record, faults);
                if instance_count(record) > 0 {
                    return Err(CloudError::DependencyViolation(format!(
                        "autoscaling group {id} still has {} instances",
                        instance_count(record)
                    )));
                }
            }
        }

        if let Some(holder) = referenced_by(&inner, &inner.records[id]) {
            return Err(CloudError::DependencyViolation(format!(
                "{kind} {id} is still referenced by {holder}"
            )));
        }

        if kind == ResourceKind::Vpc {
            let children: Vec<String> = inner
                .records
                .values()
                .filter(|r| {
                    r.auto && r.params.get("vpc_id").and_then(|v| v.as_str()) == Some(id)
                })
                .map(|r| r.handle.id.clone())
                .collect();
            for child in children {
                remove_record(&mut inner, &child);
            }
        }

        remove_record(&mut inner, id);
        Ok(())
    }

    async fn tag(&self, kind: ResourceKind, id: &str, key: &str, value: &str) -> Result<()> {
        let mut inner = self.lock();
        inner.journal.push(Call {
            op: "tag",
            kind: Some(kind),
            target: format!("{id}:{key}={value}"),
        });

        let record = inner
            .records
            .get_mut(id)
            .filter(|r| r.handle.kind == kind)
            .ok_or_else(|| CloudError::NotFound(format!("{kind} {id}")))?;
        record.tags.insert(key.to_string(), value.to_string());
        if key == "Name" {
            record
                .handle
                .attributes
                .insert("name".into(), serde_json::json!(value));
        }
        Ok(())
    }

    async fn attach(&self, kind: ResourceKind, id: &str, target_id: &str) -> Result<()> {
        let mut inner = self.lock();
        inner.journal.push(Call {
            op: "attach",
            kind: Some(kind),
            target: format!("{id}->{target_id}"),
        });

        if !inner.records.contains_key(id) {
            return Err(CloudError::NotFound(format!("{kind} {id}")));
        }
        if !inner.records.contains_key(target_id) {
            return Err(CloudError::NotFound(format!("attach target {target_id}")));
        }
        inner
            .attachments
            .insert(id.to_string(), target_id.to_string());
        Ok(())
    }

    async fn detach(&self, kind: ResourceKind, id: &str, target_id: &str) -> Result<()> {
        let mut inner = self.lock();
        inner.journal.push(Call {
            op: "detach",
            kind: Some(kind),
            target: format!("{id}-x>{target_id}"),
        });

        match inner.attachments.get(id) {
            Some(target) if target == target_id => {
                inner.attachments.remove(id);
                Ok(())
            }
            _ => Err(CloudError::NotFound(format!(
                "attachment {id}->{target_id}"
            ))),
        }
    }

    async fn list_rules(&self, group_id: &str, direction: Direction) -> Result<Vec<RuleSpec>> {
        let mut inner = self.lock();
        inner.journal.push(Call {
            op: "list_rules",
            kind: Some(ResourceKind::SecurityGroup),
            target: format!("{group_id}:{direction}"),
        });

        let rules = inner
            .rules
            .get(group_id)
            .ok_or_else(|| CloudError::NotFound(format!("security-group {group_id}")))?;
        Ok(rules
            .iter()
            .filter(|r| r.direction == direction)
            .cloned()
            .collect())
    }

    async fn add_rule(&self, group_id: &str, rule: &RuleSpec) -> Result<()> {
        let mut inner = self.lock();
        inner.journal.push(Call {
            op: "add_rule",
            kind: Some(ResourceKind::SecurityGroup),
            target: format!("{group_id}:{rule}"),
        });

        let rules = inner
            .rules
            .get_mut(group_id)
            .ok_or_else(|| CloudError::NotFound(format!("security-group {group_id}")))?;
        if !rules.contains(rule) {
            rules.push(rule.clone());
        }
        Ok(())
    }

    async fn remove_rule(&self, group_id: &str, rule: &RuleSpec) -> Result<()> {
        let mut inner = self.lock();
        inner.journal.push(Call {
            op: "remove_rule",
            kind: Some(ResourceKind::SecurityGroup),
            target: format!("{group_id}:{rule}"),
        });

        let rules = inner
            .rules
            .get_mut(group_id)
            .ok_or_else(|| CloudError::NotFound(format!("security-group {group_id}")))?;
        let before = rules.len();
        rules.retain(|r| r != rule);
        if rules.len() == before {
            return Err(CloudError::NotFound(format!("rule {rule} on {group_id}")));
        }
        Ok(())
    }

    async fn add_route(&self, table_id: &str, cidr: &str, gateway_id: &str) -> Result<()> {
        let mut inner = self.lock();
        inner.journal.push(Call {
            op: "add_route",
            kind: Some(ResourceKind::RouteTable),
            target: format!("{table_id}:{cidr}->{gateway_id}"),
        });

        let routes = inner
            .routes
            .get_mut(table_id)
            .ok_or_else(|| CloudError::NotFound(format!("route-table {table_id}")))?;
        routes.retain(|(existing_cidr, _)| existing_cidr != cidr);
        routes.push((cidr.to_string(), gateway_id.to_string()));
        Ok(())
    }

    async fn remove_route(&self, table_id: &str, cidr: &str) -> Result<()> {
        let mut inner = self.lock();
        inner.journal.push(Call {
            op: "remove_route",
            kind: Some(ResourceKind::RouteTable),
            target: format!("{table_id}:{cidr}"),
        });

        let routes = inner
            .routes
            .get_mut(table_id)
            .ok_or_else(|| CloudError::NotFound(format!("route-table {table_id}")))?;
        let before = routes.len();
        routes.retain(|(existing_cidr, _)| existing_cidr != cidr);
        if routes.len() == before {
            return Err(CloudError::NotFound(format!("route {cidr} on {table_id}")));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_vpc_comes_with_default_children() {
        let cloud = MemoryCloud::new();
        cloud.set_pending_ticks(0);

        let vpc = cloud
            .create(ResourceKind::Vpc, serde_json::json!({ "cidr_block": "10.0.0.0/16" }))
            .await
            .unwrap();

        assert!(cloud.default_security_group(&vpc.id).is_some());
        assert_eq!(cloud.ids_of(ResourceKind::RouteTable).len(), 1);
    }

    #[tokio::test]
    async fn test_pending_then_available() {
        let cloud = MemoryCloud::new();
        cloud.set_pending_ticks(2);

        let vpc = cloud
            .create(ResourceKind::Vpc, serde_json::json!({}))
            .await
            .unwrap();
        assert_eq!(vpc.state, ResourceState::Pending);

        let first = cloud.get(ResourceKind::Vpc, &vpc.id).await.unwrap();
        assert_eq!(first.state, ResourceState::Pending);
        let second = cloud.get(ResourceKind::Vpc, &vpc.id).await.unwrap();
        assert_eq!(second.state, ResourceState::Available);
    }

    #[tokio::test]
    async fn test_visibility_lag() {
        let cloud = MemoryCloud::new();
        cloud.set_pending_ticks(0);
        cloud.set_visibility_lag(1);

        let vpc = cloud
            .create(ResourceKind::Vpc, serde_json::json!({}))
            .await
            .unwrap();

        assert!(
            cloud
                .get(ResourceKind::Vpc, &vpc.id)
                .await
                .unwrap_err()
                .is_not_found()
        );
        assert!(cloud.get(ResourceKind::Vpc, &vpc.id).await.is_ok());
    }

    #[tokio::test]
    async fn test_delete_respects_references() {
        let cloud = MemoryCloud::new();
        cloud.set_pending_ticks(0);

        let vpc = cloud
            .create(ResourceKind::Vpc, serde_json::json!({}))
            .await
            .unwrap();
        let subnet = cloud
            .create(
                ResourceKind::Subnet,
                serde_json::json!({ "vpc_id": vpc.id }),
            )
            .await
            .unwrap();

        let err = cloud.delete(ResourceKind::Vpc, &vpc.id).await.unwrap_err();
        assert!(err.is_dependency_violation());

        cloud.delete(ResourceKind::Subnet, &subnet.id).await.unwrap();
        cloud.delete(ResourceKind::Vpc, &vpc.id).await.unwrap();
        assert!(!cloud.contains(&vpc.id));
    }

    #[tokio::test]
    async fn test_default_group_is_protected() {
        let cloud = MemoryCloud::new();
        cloud.set_pending_ticks(0);

        let vpc = cloud
            .create(ResourceKind::Vpc, serde_json::json!({}))
            .await
            .unwrap();
        let default_sg = cloud.default_security_group(&vpc.id).unwrap();

        let err = cloud
            .delete(ResourceKind::SecurityGroup, &default_sg)
            .await
            .unwrap_err();
        assert!(err.is_permanent());
    }
}
