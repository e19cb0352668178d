//! Plan catalog endpoint (`/api/config/plans`).

use cartas_core::constants::paths;
use cartas_core::error::CtResult;
use cartas_models::PlanStrategy;

use crate::client::ApiClient;

impl ApiClient {
    /// Plans offered for purchase. Works without a token.
    pub async fn get_plans(&self) -> CtResult<Vec<PlanStrategy>> {
        self.get_list(paths::PLANS).await
    }
}
