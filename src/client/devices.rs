//! Organization-device operations.
//!
//! See <https://developer.apple.com/documentation/applebusinessmanagerapi> and
//! <https://developer.apple.com/documentation/appleschoolmanagerapi> for the
//! resource shapes these calls return.

// crates.io
use serde_json::Value;
// self
use crate::{
	_prelude::*,
	client::{Client, request::GetOptions},
};

impl Client {
	/// Lists the devices associated with the organization.
	pub async fn list_org_devices(&self, options: GetOptions) -> Result<Value> {
		self.get("v1/orgDevices", options).await
	}

	/// Retrieves a single device and its selected attributes.
	pub async fn org_device(&self, device_id: &str, options: GetOptions) -> Result<Value> {
		self.get(&format!("v1/orgDevices/{device_id}"), options).await
	}

	/// Fetches the identifier of the MDM server a device is assigned to.
	pub async fn assigned_mdm_server(
		&self,
		device_id: &str,
		options: GetOptions,
	) -> Result<Value> {
		self.get(&format!("v1/orgDevices/{device_id}/relationships/assignedServer"), options)
			.await
	}
}
