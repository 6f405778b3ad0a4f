use crate::state::BatchRequest;

#[derive(Clone, Debug, PartialEq)]
pub enum Effect {
    FetchBatch(BatchRequest),
    SearchCatalog { term: String },
    CancelSearch,
}
