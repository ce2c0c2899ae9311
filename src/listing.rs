use crate::models::FileRecord;

/// Pairs each name with `<base_url>/files/<name>`, keeping input order.
pub fn to_records<I, S>(names: I, base_url: &str) -> Vec<FileRecord>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    names
        .into_iter()
        .map(|name| {
            let name = name.into();
            let url = format!("{base_url}/files/{name}");
            FileRecord { name, url }
        })
        .collect()
}
