use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use shared_database::Database;
use shared_models::error::AppError;
use shared_models::pagination::{PageQuery, Paginated};
use shared_models::workshop::{InspectionStatus, Recommendation};
use shared_utils::extractor::authorize_mechanic_or_owner;
use shared_utils::jwt::IdentityClaim;
use shared_utils::validators::required;
use shared_utils::AppState;

use crate::models::{CreateRecommendationRequest, RecommendationFilter};

fn not_found(recommendation_id: i64) -> AppError {
    AppError::NotFound(format!("Recommendation {} not found", recommendation_id))
}

pub struct RecommendationService {
    db: Arc<Database>,
}

impl RecommendationService {
    pub fn new(state: &AppState) -> Self {
        Self {
            db: state.db.clone(),
        }
    }

    pub async fn list_recommendations(
        &self,
        filter: RecommendationFilter,
        page: &PageQuery,
    ) -> Result<Paginated<Recommendation>, AppError> {
        let recommendations = self
            .db
            .recommendations
            .filter(|r| {
                filter.vehicle_id.map_or(true, |v| r.vehicle_id == v)
                    && filter.resolved.map_or(true, |resolved| r.resolved == resolved)
                    && filter.priority.map_or(true, |p| r.priority == p)
            })
            .await;

        Ok(Paginated::from_items(recommendations, page))
    }

    pub async fn create_recommendation(
        &self,
        request: CreateRecommendationRequest,
    ) -> Result<Recommendation, AppError> {
        debug!("Adding recommendation to inspection {}", request.inspection_id);

        let _relations = self.db.lock_relations().await;
        let inspection = self
            .db
            .inspections
            .get(request.inspection_id)
            .await
            .ok_or_else(|| {
                AppError::NotFound(format!("Inspection {} not found", request.inspection_id))
            })?;
        if inspection.status == InspectionStatus::Cancelada {
            return Err(AppError::Conflict(
                "Cancelled inspections cannot receive recommendations".to_string(),
            ));
        }

        let description = required("description", &request.description)?;
        if request.due_mileage.is_some_and(|m| m < 0) {
            return Err(AppError::ValidationError(
                "Due mileage must not be negative".to_string(),
            ));
        }

        let recommendation = self
            .db
            .recommendations
            .insert(|id| {
                let now = Utc::now();
                Recommendation {
                    id,
                    inspection_id: inspection.id,
                    vehicle_id: inspection.vehicle_id,
                    description,
                    priority: request.priority,
                    due_mileage: request.due_mileage,
                    due_date: request.due_date,
                    resolved: false,
                    created_at: now,
                    updated_at: now,
                }
            })
            .await;

        info!(
            "Created recommendation {} for vehicle {}",
            recommendation.id, recommendation.vehicle_id
        );
        Ok(recommendation)
    }

    pub async fn get_recommendation(
        &self,
        recommendation_id: i64,
        caller: &IdentityClaim,
    ) -> Result<Recommendation, AppError> {
        let recommendation = self
            .db
            .recommendations
            .get(recommendation_id)
            .await
            .ok_or_else(|| not_found(recommendation_id))?;
        authorize_mechanic_or_owner(caller, self.db.vehicle_owner(recommendation.vehicle_id).await)?;
        Ok(recommendation)
    }

    /// Marks the recommendation as done. Resolving twice is a no-op.
    pub async fn resolve_recommendation(
        &self,
        recommendation_id: i64,
    ) -> Result<Recommendation, AppError> {
        let recommendation = self
            .db
            .recommendations
            .update(recommendation_id, |recommendation, _| {
                if !recommendation.resolved {
                    recommendation.resolved = true;
                    recommendation.updated_at = Utc::now();
                }
                Ok::<_, AppError>(())
            })
            .await?
            .ok_or_else(|| not_found(recommendation_id))?;

        info!("Resolved recommendation {}", recommendation_id);
        Ok(recommendation)
    }

    pub async fn delete_recommendation(&self, recommendation_id: i64) -> Result<(), AppError> {
        self.db
            .recommendations
            .remove(recommendation_id)
            .await
            .ok_or_else(|| not_found(recommendation_id))?;

        info!("Deleted recommendation {}", recommendation_id);
        Ok(())
    }
}
