//! Device-activity operations: querying activities and creating
//! assignment/unassignment requests.

// crates.io
use serde_json::{Value, json};
// self
use crate::{
	_prelude::*,
	client::{Client, request::GetOptions},
};

/// Device-management action recorded by an activity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActivityType {
	/// Assign devices to an MDM server.
	AssignDevices,
	/// Unassign devices from an MDM server.
	UnassignDevices,
}
impl ActivityType {
	/// Returns the wire-level `activityType` attribute value.
	pub const fn as_str(self) -> &'static str {
		match self {
			ActivityType::AssignDevices => "ASSIGN_DEVICES",
			ActivityType::UnassignDevices => "UNASSIGN_DEVICES",
		}
	}
}
impl Display for ActivityType {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

impl Client {
	/// Retrieves a single device activity created by a management action.
	pub async fn org_device_activity(
		&self,
		activity_id: &str,
		options: GetOptions,
	) -> Result<Value> {
		self.get(&format!("v1/orgDeviceActivities/{activity_id}"), options).await
	}

	/// Assigns devices to an MDM server, returning the created activity and status.
	pub async fn assign_devices(
		&self,
		device_ids: &[&str],
		mdm_server_id: &str,
	) -> Result<(Value, u16)> {
		self.create_activity(ActivityType::AssignDevices, device_ids, mdm_server_id).await
	}

	/// Unassigns devices from an MDM server, returning the created activity and status.
	pub async fn unassign_devices(
		&self,
		device_ids: &[&str],
		mdm_server_id: &str,
	) -> Result<(Value, u16)> {
		self.create_activity(ActivityType::UnassignDevices, device_ids, mdm_server_id).await
	}

	/// Creates an activity of the given type for a batch of devices.
	pub async fn create_activity(
		&self,
		activity: ActivityType,
		device_ids: &[&str],
		mdm_server_id: &str,
	) -> Result<(Value, u16)> {
		let body = activity_body(activity, device_ids, mdm_server_id);

		self.post_json("v1/orgDeviceActivities", &body).await
	}
}

fn activity_body(activity: ActivityType, device_ids: &[&str], mdm_server_id: &str) -> Value {
	json!({
		"data": {
			"type": "orgDeviceActivities",
			"attributes": {
				"activityType": activity.as_str(),
			},
			"relationships": {
				"mdmServer": {
					"data": {
						"type": "mdmServers",
						"id": mdm_server_id,
					},
				},
				"devices": {
					"data": device_ids
						.iter()
						.map(|id| json!({ "type": "orgDevices", "id": id }))
						.collect::<Vec<_>>(),
				},
			},
		},
	})
}
