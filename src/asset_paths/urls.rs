/// Join a virtual folder and a file name into a URL path.
///
/// The result always uses forward slashes and exactly one separator between the folder and
/// the file name, regardless of trailing slashes on the folder or the native separator that
/// was used when the folder was configured.
pub fn join_url(folder: &str, file_name: &str) -> String {
    let folder = folder.replace('\\', "/");
    let folder = folder.trim_end_matches('/');
    let file_name = file_name.trim_start_matches('/');

    format!("{folder}/{file_name}")
}
