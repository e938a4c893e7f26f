//! Device-management-server operations.

// crates.io
use serde_json::Value;
// self
use crate::{
	_prelude::*,
	client::{Client, request::GetOptions},
};

impl Client {
	/// Lists the MDM servers associated with the organization.
	pub async fn list_mdm_servers(&self, options: GetOptions) -> Result<Value> {
		self.get("v1/mdmServers", options).await
	}

	/// Lists the identifiers of the devices assigned to one MDM server.
	pub async fn devices_assigned_to_mdm_server(
		&self,
		mdm_server_id: &str,
		options: GetOptions,
	) -> Result<Value> {
		self.get(&format!("v1/mdmServers/{mdm_server_id}/relationships/devices"), options).await
	}
}
