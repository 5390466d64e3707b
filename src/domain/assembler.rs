use super::order::{AssembledOrder, OrderDraft, OrderItemDraft, OrderStatus, ValidatedOrder};

/// Builds the records to persist for a validated order. New orders start
/// `pending`; the earliest pickup estimate is the validation instant.
pub fn assemble(validated: &ValidatedOrder) -> AssembledOrder {
    let order = OrderDraft {
        user_id: validated.user_id,
        truck_id: validated.truck_id,
        order_status: OrderStatus::Pending,
        total_price: validated.total_price.clone(),
        scheduled_pickup_time: validated.pickup_time,
        estimated_earliest_pickup: validated.validated_at,
    };

    let items = validated
        .lines
        .iter()
        .map(|line| OrderItemDraft {
            item_id: line.item_id,
            quantity: line.quantity,
            unit_price: line.unit_price.clone(),
            line_total: line.line_total.clone(),
        })
        .collect();

    AssembledOrder { order, items }
}
