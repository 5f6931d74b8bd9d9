use anyhow::Result;
use contracts::domain::a001_consumer::aggregate::Consumer;
use contracts::enums::DashboardTab;

use super::repository;

/// Сборка полного агрегата одного лицевого счёта
pub async fn load(consumer_id: &str) -> Result<Option<Consumer>> {
    let Some(model) = repository::get_by_id(consumer_id).await? else {
        return Ok(None);
    };

    let ids = vec![model.id.clone()];
    let mut consumer: Consumer = model.into();
    attach_children(std::slice::from_mut(&mut consumer), &ids).await?;
    Ok(Some(consumer))
}

/// Список агрегатов для дашборда: родительские строки одним запросом,
/// затем по одному batched-запросу на каждую дочернюю таблицу
pub async fn load_all(
    tab: Option<DashboardTab>,
    search: Option<&str>,
    sort: repository::ConsumerSort,
) -> Result<Vec<Consumer>> {
    let models = repository::list_parents(tab, search, sort).await?;
    let ids: Vec<String> = models.iter().map(|m| m.id.clone()).collect();

    let mut consumers: Vec<Consumer> = models.into_iter().map(Into::into).collect();
    attach_children(&mut consumers, &ids).await?;
    Ok(consumers)
}

async fn attach_children(consumers: &mut [Consumer], ids: &[String]) -> Result<()> {
    let mut bill_files = repository::load_bill_files(ids).await?;
    let mut work_lists = repository::load_work_lists(ids).await?;
    let mut notes = repository::load_notes(ids).await?;
    let mut payments = repository::load_payments(ids).await?;

    for consumer in consumers.iter_mut() {
        let id = consumer.to_string_id();
        if let Some(files) = bill_files.remove(&id) {
            consumer.bill_files = files;
        }
        if let Some(items) = work_lists.remove(&id) {
            consumer.work_list = items;
        }
        if let Some(journal) = notes.remove(&id) {
            consumer.notes = journal;
        }
        consumer.payment = payments.remove(&id);
    }
    Ok(())
}
